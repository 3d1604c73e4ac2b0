use super::aabb::Aabb;

/// Anything the broad phase can sort and sweep
pub trait Bounded {
    fn aabb(&self) -> &Aabb;
}

/// Sweep-and-Prune broad phase.
///
/// Returns index pairs (into `objects`) whose AABB volumes overlap.
/// Candidates are found by sweeping the X axis with an active set, then
/// filtered to pairs that intersect on all three axes, so the output is a
/// superset of nothing and a subset of true X-candidates: exactly the
/// intersecting pairs. Objects with empty volumes never pair. Tie-break
/// order on equal `min.x` is unspecified.
pub fn sweep_and_prune<T: Bounded>(objects: &[T]) -> Vec<(usize, usize)> {
    let mut sorted: Vec<usize> = (0..objects.len())
        .filter(|&i| !objects[i].aabb().is_empty())
        .collect();

    // Sort on the x axis
    sorted.sort_by(|&a, &b| {
        objects[a]
            .aabb()
            .min
            .x
            .partial_cmp(&objects[b].aabb().min.x)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut candidates: Vec<(usize, usize)> = Vec::new();
    let mut active: Vec<usize> = Vec::new();

    for &i in &sorted {
        let min_x = objects[i].aabb().min.x;
        active.retain(|&a| objects[a].aabb().max.x > min_x);
        for &a in &active {
            candidates.push((i, a));
        }
        active.push(i);
    }

    // Keep only candidates overlapping on every axis
    candidates
        .into_iter()
        .filter(|&(a, b)| objects[a].aabb().intersects(objects[b].aabb()))
        .collect()
}

use crate::constants::narrow_phase::MAX_GJK_ITERATIONS;
use crate::math::Vec3;

use super::epa;

/// A Minkowski-difference vertex with the source indices that produced
/// it, kept for contact recovery after EPA.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportPoint {
    pub point: Vec3,
    pub index_a: usize,
    pub index_b: usize,
}

/// Result of a positive narrow-phase test
#[derive(Debug, Clone, Copy)]
pub struct CollisionInfo {
    /// World-space contact point (midpoint of the recovered points on A and B)
    pub contact: Vec3,
    /// Contact normal pointing out of the Minkowski difference
    pub normal: Vec3,
    /// Penetration depth along the normal
    pub depth: f64,
}

/// Farthest vertex of `vertices` in `direction`, with its index
fn support_point(vertices: &[Vec3], direction: Vec3) -> (Vec3, usize) {
    let mut max_distance = f64::NEG_INFINITY;
    let mut max = (Vec3::ZERO, 0);

    for (i, v) in vertices.iter().enumerate() {
        let distance = v.dot(direction);
        if distance > max_distance {
            max_distance = distance;
            max = (*v, i);
        }
    }

    max
}

/// Support of the Minkowski difference `A − B` in direction `d`
pub(super) fn minkowski_support(a: &[Vec3], b: &[Vec3], d: Vec3) -> SupportPoint {
    let (sa, ia) = support_point(a, d);
    let (sb, ib) = support_point(b, -d);
    SupportPoint {
        point: sa - sb,
        index_a: ia,
        index_b: ib,
    }
}

fn same_direction(direction: Vec3, ao: Vec3) -> bool {
    direction.dot(ao) > 0.0
}

/// Working simplex of up to four Minkowski vertices
pub(super) struct Simplex {
    points: [SupportPoint; 4],
    size: usize,
    direction: Vec3,
}

impl Simplex {
    fn new() -> Self {
        Self {
            points: [SupportPoint::default(); 4],
            size: 0,
            direction: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    pub(super) fn points(&self) -> &[SupportPoint] {
        &self.points[..self.size]
    }

    fn push_front(&mut self, p: SupportPoint) {
        for i in (1..=self.size.min(3)).rev() {
            self.points[i] = self.points[i - 1];
        }
        self.points[0] = p;
        self.size = (self.size + 1).min(4);
    }

    fn set(&mut self, p: SupportPoint, index: usize) {
        self.points[index] = p;
        self.size = index + 1;
    }

    /// Advance the simplex toward enclosing the origin. True once a
    /// tetrahedron contains it.
    fn next(&mut self) -> bool {
        match self.size {
            2 => self.line(),
            3 => self.triangle(),
            4 => self.tetrahedron(),
            _ => false,
        }
    }

    fn line(&mut self) -> bool {
        let a = self.points[0].point;
        let b = self.points[1].point;

        let ab = b - a;
        let ao = -a;

        if same_direction(ab, ao) {
            self.direction = ab.cross(ao).cross(ab).normalize();
        } else {
            let p = self.points[0];
            self.set(p, 0);
            self.direction = ao.normalize();
        }

        false
    }

    fn triangle(&mut self) -> bool {
        let a = self.points[0].point;
        let b = self.points[1].point;
        let c = self.points[2].point;

        let ab = b - a;
        let ac = c - a;
        let ao = -a;

        let abc = ab.cross(ac);

        if same_direction(abc.cross(ac), ao) {
            if same_direction(ac, ao) {
                let (pa, pc) = (self.points[0], self.points[2]);
                self.set(pa, 0);
                self.set(pc, 1);
                self.direction = ac.cross(ao).cross(ac).normalize();
            } else {
                let (pa, pb) = (self.points[0], self.points[1]);
                self.set(pa, 0);
                self.set(pb, 1);
                return self.line();
            }
        } else if same_direction(ab.cross(abc), ao) {
            let (pa, pb) = (self.points[0], self.points[1]);
            self.set(pa, 0);
            self.set(pb, 1);
            return self.line();
        } else if same_direction(abc, ao) {
            self.direction = abc.normalize();
        } else {
            let (pa, pb, pc) = (self.points[0], self.points[1], self.points[2]);
            self.set(pa, 0);
            self.set(pc, 1);
            self.set(pb, 2);
            self.direction = (-abc).normalize();
        }

        false
    }

    fn tetrahedron(&mut self) -> bool {
        let a = self.points[0].point;
        let b = self.points[1].point;
        let c = self.points[2].point;
        let d = self.points[3].point;

        let ab = b - a;
        let ac = c - a;
        let ad = d - a;
        let ao = -a;

        let abc = ab.cross(ac);
        if same_direction(abc, ao) {
            let (pa, pb, pc) = (self.points[0], self.points[1], self.points[2]);
            self.set(pa, 0);
            self.set(pb, 1);
            self.set(pc, 2);
            return self.triangle();
        }

        let acd = ac.cross(ad);
        if same_direction(acd, ao) {
            let (pa, pc, pd) = (self.points[0], self.points[2], self.points[3]);
            self.set(pa, 0);
            self.set(pc, 1);
            self.set(pd, 2);
            return self.triangle();
        }

        let adb = ad.cross(ab);
        if same_direction(adb, ao) {
            let (pa, pd, pb) = (self.points[0], self.points[3], self.points[1]);
            self.set(pa, 0);
            self.set(pd, 1);
            self.set(pb, 2);
            return self.triangle();
        }

        true
    }
}

/// GJK boolean intersection test over two convex point clouds.
///
/// On hit the colliding simplex is handed to EPA, which recovers the
/// penetration normal, depth and contact point. Non-convergence is
/// logged and treated as a miss.
pub fn gjk(a: &[Vec3], b: &[Vec3]) -> Option<CollisionInfo> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let mut simplex = Simplex::new();

    // First support point seeds the search direction
    let support = minkowski_support(a, b, simplex.direction);
    simplex.push_front(support);
    simplex.direction = (-support.point).normalize();

    let mut iterations = 0;
    loop {
        let support = minkowski_support(a, b, simplex.direction);
        if support.point.dot(simplex.direction) <= 0.0 {
            return None;
        }
        simplex.push_front(support);

        if simplex.next() {
            return Some(epa::epa(&simplex, a, b));
        }

        iterations += 1;
        if iterations >= MAX_GJK_ITERATIONS {
            log::warn!(
                "[gjk] no enclosing simplex after {} iterations, treating as miss",
                MAX_GJK_ITERATIONS
            );
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Quat};
    use crate::scene::Transform;

    fn cube_hull() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ]
    }

    fn cube_at(position: Vec3) -> Vec<Vec3> {
        let mut transform = Transform::new(None);
        transform.position = position;
        let mut model = Mat4::new();
        transform.model_into(&mut model, Quat::IDENTITY, position);
        cube_hull()
            .iter()
            .map(|p| p.mul_matrix(model.out()).0)
            .collect()
    }

    #[test]
    fn test_colliding_unit_cubes() {
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::splat(0.5));

        let info = gjk(&a, &b).expect("overlapping cubes must collide");
        assert!(
            info.depth >= 1.5 && info.depth < 1.51,
            "expected depth in [1.50, 1.51), got {}",
            info.depth
        );
    }

    #[test]
    fn test_disjoint_unit_cubes() {
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::splat(2.0));
        assert!(gjk(&a, &b).is_none());
    }

    #[test]
    fn test_symmetry_of_normal_and_depth() {
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(0.5, 0.25, -0.3));

        let ab = gjk(&a, &b).expect("hit");
        let ba = gjk(&b, &a).expect("hit");

        assert!((ab.depth - ba.depth).abs() < 1e-3);
        assert!((ab.normal + ba.normal).length() < 1e-3);
    }

    #[test]
    fn test_touching_faces_do_not_bind_contact_inside() {
        // Deep vertical overlap: the contact normal must be axis-aligned
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(0.0, 1.5, 0.0));

        let info = gjk(&a, &b).expect("hit");
        assert!((info.normal.x.abs() - 0.0).abs() < 1e-9);
        assert!((info.normal.z.abs() - 0.0).abs() < 1e-9);
        assert!((info.depth - 0.501).abs() < 1e-6);
    }

    #[test]
    fn test_empty_hull_is_a_miss() {
        let a = cube_at(Vec3::ZERO);
        assert!(gjk(&a, &[]).is_none());
        assert!(gjk(&[], &a).is_none());
    }
}

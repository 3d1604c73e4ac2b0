use crate::constants::narrow_phase::{DEPTH_PADDING, EPSILON, MAX_EPA_ITERATIONS};
use crate::math::Vec3;

use super::gjk::{minkowski_support, CollisionInfo, Simplex, SupportPoint};

/// Outward face normal and its signed distance from the origin
#[derive(Debug, Clone, Copy)]
struct FaceNormal {
    normal: Vec3,
    distance: f64,
}

/// Expanding Polytope Algorithm.
///
/// Extrudes the colliding GJK simplex into a polytope around the origin
/// and expands it toward the surface of the Minkowski difference until
/// the closest face converges. Returns the contact normal, the
/// penetration depth (plus a small padding) and the recovered contact
/// point. On timeout the best face so far is reported.
pub(super) fn epa(simplex: &Simplex, a: &[Vec3], b: &[Vec3]) -> CollisionInfo {
    let mut points: Vec<SupportPoint> = simplex.points().to_vec();
    let mut faces: Vec<[usize; 3]> = vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];

    let (mut normals, mut min_face) = face_normals(&points, &faces);
    let mut min_normal = normals[min_face].normal;
    let mut min_distance = f64::INFINITY;

    let mut iterations = 0;
    while min_distance == f64::INFINITY && iterations < MAX_EPA_ITERATIONS {
        min_normal = normals[min_face].normal;
        min_distance = normals[min_face].distance;

        let support = minkowski_support(a, b, min_normal);
        let s_distance = min_normal.dot(support.point);

        if (s_distance - min_distance).abs() > EPSILON {
            min_distance = f64::INFINITY;

            // Remove every face the new support point can see and keep
            // the horizon edges (dropping anti-parallel duplicates)
            let mut unique_edges: Vec<(usize, usize)> = Vec::new();
            let mut i = 0;
            while i < normals.len() {
                if normals[i].normal.dot(support.point) - normals[i].distance > 0.0 {
                    let face = faces[i];
                    add_if_unique_edge(&mut unique_edges, (face[0], face[1]));
                    add_if_unique_edge(&mut unique_edges, (face[1], face[2]));
                    add_if_unique_edge(&mut unique_edges, (face[2], face[0]));

                    faces.swap_remove(i);
                    normals.swap_remove(i);
                } else {
                    i += 1;
                }
            }

            if unique_edges.is_empty() {
                // The support point sees no face: a degenerate polytope.
                // Keep the best face found so far.
                log::warn!("[epa] degenerate polytope expansion, keeping best face");
                break;
            }

            let new_faces: Vec<[usize; 3]> = unique_edges
                .iter()
                .map(|&(e0, e1)| [e0, e1, points.len()])
                .collect();
            points.push(support);

            let (new_normals, new_min_face) = face_normals(&points, &new_faces);

            let mut old_min_distance = f64::INFINITY;
            for (i, n) in normals.iter().enumerate() {
                if n.distance < old_min_distance {
                    old_min_distance = n.distance;
                    min_face = i;
                }
            }
            if new_normals[new_min_face].distance < old_min_distance {
                min_face = new_min_face + normals.len();
            }

            faces.extend(new_faces);
            normals.extend(new_normals);
            if min_face >= normals.len() {
                min_face = 0;
            }
        }
        iterations += 1;
    }

    if min_distance == f64::INFINITY {
        // Timed out without converging; report the closest face found
        min_normal = normals[min_face].normal;
        min_distance = normals[min_face].distance;
    }

    let face = faces[min_face];
    let (sa, sb, sc) = (points[face[0]], points[face[1]], points[face[2]]);

    // Project the origin onto the closest face and express the projection
    // in barycentric coordinates of that face
    let distance = sa.point.dot(min_normal);
    let projected = min_normal * distance;
    let (u, v, w) = barycentric(projected, sa.point, sb.point, sc.point);

    // Recover the matching triangles on both source hulls
    let contact_a = a[sa.index_a] * u + a[sb.index_a] * v + a[sc.index_a] * w;
    let contact_b = b[sa.index_b] * u + b[sb.index_b] * v + b[sc.index_b] * w;

    CollisionInfo {
        contact: (contact_a + contact_b) * 0.5,
        normal: min_normal,
        depth: min_distance + DEPTH_PADDING,
    }
}

/// Outward normals and distances for a face list, plus the index of the
/// face closest to the origin. Zero-area faces get an infinite distance
/// so they are never selected.
fn face_normals(points: &[SupportPoint], faces: &[[usize; 3]]) -> (Vec<FaceNormal>, usize) {
    let mut min_face = 0;
    let mut min_distance = f64::INFINITY;
    let mut normals = Vec::with_capacity(faces.len());

    for (i, face) in faces.iter().enumerate() {
        let a = points[face[0]].point;
        let b = points[face[1]].point;
        let c = points[face[2]].point;

        let mut normal = (b - a).cross(c - a);
        let mut distance;

        if normal.length() < EPSILON {
            normal = Vec3::ZERO;
            distance = f64::INFINITY;
        } else {
            normal = normal.normalize();
            distance = normal.dot(a);
        }

        if distance < 0.0 {
            normal = -normal;
            distance = -distance;
        }

        normals.push(FaceNormal { normal, distance });

        if distance < min_distance {
            min_face = i;
            min_distance = distance;
        }
    }

    (normals, min_face)
}

/// Keep `edge` unless its reverse is already present, in which case the
/// pair cancels (an interior edge of the removed region)
fn add_if_unique_edge(edges: &mut Vec<(usize, usize)>, edge: (usize, usize)) {
    if let Some(i) = edges.iter().position(|&e| e.0 == edge.1 && e.1 == edge.0) {
        edges.remove(i);
    } else {
        edges.push(edge);
    }
}

/// Barycentric coordinates of `p` in triangle `(a, b, c)`.
///
/// A degenerate triangle falls back to projecting onto its longest live
/// edge; a fully collapsed triangle reports vertex `a`.
fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (f64, f64, f64) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;

    if denom.abs() <= EPSILON {
        // Zero-area triangle
        if d00 <= EPSILON && d11 <= EPSILON {
            // Collapsed to a point
            (1.0, 0.0, 0.0)
        } else if d00 > EPSILON {
            // Collapsed to a line through edge AB
            let t = v2.dot(v0) / d00;
            (1.0 - t, t, 0.0)
        } else if d11 > EPSILON {
            // Collapsed to a line through edge AC
            let t = v2.dot(v1) / d11;
            (1.0 - t, 0.0, t)
        } else {
            (1.0, 0.0, 0.0)
        }
    } else {
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        (1.0 - v - w, v, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barycentric_interior_point() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 1.0, 0.0);
        let centroid = (a + b + c) * (1.0 / 3.0);

        let (u, v, w) = barycentric(centroid, a, b, c);
        assert!((u - 1.0 / 3.0).abs() < 1e-12);
        assert!((v - 1.0 / 3.0).abs() < 1e-12);
        assert!((w - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_barycentric_vertices() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 2.0, 0.0);

        assert_eq!(barycentric(a, a, b, c), (1.0, 0.0, 0.0));
        let (u, v, w) = barycentric(b, a, b, c);
        assert!((u - 0.0).abs() < 1e-12 && (v - 1.0).abs() < 1e-12 && w.abs() < 1e-12);
    }

    #[test]
    fn test_barycentric_degenerate_line() {
        // b == c collapses the triangle onto edge AB
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);
        let (u, v, w) = barycentric(Vec3::new(1.0, 0.0, 0.0), a, b, b);
        assert!((u - 0.5).abs() < 1e-9);
        assert!((v + w - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_barycentric_degenerate_point() {
        let a = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(barycentric(Vec3::ZERO, a, a, a), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_edge_cancellation() {
        let mut edges = Vec::new();
        add_if_unique_edge(&mut edges, (0, 1));
        add_if_unique_edge(&mut edges, (1, 2));
        add_if_unique_edge(&mut edges, (1, 0)); // reverse of (0, 1) cancels
        assert_eq!(edges, vec![(1, 2)]);
    }
}

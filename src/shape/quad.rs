use super::Shape;
use crate::math::{Vec2, Vec3};

/// Unit quad in the `z = 0` plane, facing −Z.
///
/// The collider hull is extruded one unit toward +Z so the quad has a
/// non-empty collision volume.
pub fn quad() -> Shape {
    let positions = vec![
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
    ];

    let uvs = vec![
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ];

    let normals = vec![Vec3::new(0.0, 0.0, -1.0); 6];

    // Convex bounding hull
    let collider = vec![
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
    ];

    Shape {
        positions,
        uvs,
        normals,
        collider,
    }
}

use super::Shape;
use crate::math::{Vec2, Vec3};

/// Square pyramid, apex at `(0, 1, 0)`, base at `y = −1`
pub fn pyramid() -> Shape {
    let positions = vec![
        // Front
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        // Left
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, -1.0),
        // Right
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(0.0, 1.0, 0.0),
        // Back
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        // Bottom
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
    ];

    let uvs = vec![
        Vec2::new(0.5, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        //
        Vec2::new(0.5, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        //
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(0.5, 0.0),
        //
        Vec2::new(0.5, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        //
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ];

    let mut normals = Vec::with_capacity(18);
    for (n, count) in [
        (Vec3::new(0.0, 0.5, -0.5), 3), // front
        (Vec3::new(-0.5, 0.5, 0.0), 3), // left
        (Vec3::new(0.5, 0.5, 0.0), 3),  // right
        (Vec3::new(0.0, 0.5, 0.5), 3),  // back
        (Vec3::new(0.0, -1.0, 0.0), 6), // bottom
    ] {
        normals.extend(std::iter::repeat(n).take(count));
    }

    // Convex bounding hull
    let collider = vec![
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(0.0, 1.0, 0.0),
    ];

    Shape {
        positions,
        uvs,
        normals,
        collider,
    }
}

//! Canonical shape library.
//!
//! Shapes are authored in object space: the cube spans ±1 on every axis,
//! the pyramid has its apex at `(0, 1, 0)` and base at `y = −1`, the quad
//! sits at `z = 0`. Purely data, no behavior.

mod cube;
mod pyramid;
mod quad;

pub use cube::cube;
pub use pyramid::pyramid;
pub use quad::quad;

use crate::math::{Vec2, Vec3};

/// Mesh and collision data for one canonical shape.
///
/// `positions` is a triangle list with matching `uvs` and per-vertex
/// `normals`; `collider` is the vertex set of the convex body (not the
/// triangle list), used by the narrow phase.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub collider: Vec<Vec3>,
}

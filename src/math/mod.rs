//! Deterministic double-precision math primitives.
//!
//! Conventions shared by the whole engine:
//! - `Mat4` is column-major (OpenGL order) and composes through a pair of
//!   scratch buffers so a chain of builder calls never allocates.
//! - Quaternion product `a * b` applies `b` first.
//! - `normalize` of a zero-length vector returns the zero vector, never NaN.

pub mod functions;
pub mod matrix;
pub mod quaternion;
pub mod vector;

pub use functions::{clamp, linear_step, step};
pub use matrix::{Mat4, MatrixData, IDENTITY};
pub use quaternion::Quat;
pub use vector::{Vec2, Vec3};

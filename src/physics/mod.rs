//! Collision and motion pipeline.
//!
//! Per tick: integrate (`integrator`), refresh world-space hulls, find
//! AABB overlap candidates (`sap`), test candidates exactly (`gjk` +
//! `epa`), resolve contacts (`resolver`).

pub mod aabb;
pub mod epa;
pub mod gjk;
pub mod integrator;
pub mod resolver;
pub mod sap;

pub use aabb::Aabb;
pub use gjk::{gjk, CollisionInfo, SupportPoint};
pub use integrator::{integrate, terminal_velocity};
pub use resolver::resolve_contact;
pub use sap::{sweep_and_prune, Bounded};

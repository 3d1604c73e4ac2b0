//! Scene graph, node lifecycle and the world tick.
//!
//! The scene owns its nodes in an id-keyed arena; parent links are ids
//! resolved through the arena, never owning references. All mutation
//! from outside the tick goes through the deferred command queue and is
//! drained atomically at the start of the next tick.

mod camera;
mod graph;
mod input;
mod light;
mod node;
mod object;
mod transform;

pub use camera::{Camera, CameraSettings, Projection};
pub use graph::{Departed, DepartedKind, Scene, SceneContext, SceneOptions, SceneQueue, SpawnArgs};
pub use input::{InputDevice, InputEvent};
pub use light::{DirectionalLight, Light, PointLight, SpotLight};
pub use node::{Node, Role};
pub use object::{
    Controller, ControllerFns, PhysicsTemplate, SceneObject, SceneObjectArgs, Space,
};
pub use transform::Transform;

/// Scene-unique entity id, assigned monotonically and never reused
/// within a session
pub type NodeId = u32;

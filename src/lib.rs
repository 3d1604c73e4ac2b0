//! Orrery Engine — server-side core of a real-time multi-user 3D scene
//! simulator.
//!
//! The server owns the authoritative world: scene graph and node
//! lifecycle, physics integration, the SAP + GJK/EPA collision
//! pipeline, and a block-encoded state store that per-session cursors
//! stream to thin rendering clients over a duplex binary channel. The
//! transport, the GPU renderer and asset decoding live outside this
//! crate; sessions hand the transport raw block frames.

// Tunables and error taxonomy
pub mod constants;
pub mod error;

// Leaves-first core
pub mod math;
pub mod shape;
pub mod encoding;

// World model
pub mod physics;
pub mod rendering;
pub mod scene;

// State streaming
pub mod state;
pub mod session;
pub mod simulation;

pub use error::{SimError, SimResult};
pub use math::{Mat4, Quat, Vec2, Vec3};
pub use rendering::{Material, ResourceManager, Texture, TextureGroup};
pub use scene::{
    Camera, CameraSettings, Controller, ControllerFns, InputDevice, InputEvent, Light, Node,
    NodeId, PhysicsTemplate, Role, Scene, SceneContext, SceneObject, SceneObjectArgs,
    SceneOptions, SceneQueue, SpawnArgs,
};
pub use session::Session;
pub use simulation::{Simulation, SimulationConfig};
pub use state::{BlockKind, StateReader, StateStore};

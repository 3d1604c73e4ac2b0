//! Engine-wide tunables.
//!
//! Grouped by subsystem so call sites read as
//! `constants::physics::AIR_DENSITY` rather than a bare magic number.

/// Physics integration constants
pub mod physics {
    /// Air density used by the drag model (kg/m³)
    pub const AIR_DENSITY: f64 = 1.2;

    /// Drag coefficient of the reference body
    pub const DRAG_COEFFICIENT: f64 = 1.05;

    /// Reference cross-section area for drag (m²)
    pub const REFERENCE_AREA: f64 = 1.0;

    /// Default gravity acceleration (m/s²), pointing down the Y axis
    pub const GRAVITY_Y: f64 = -9.8;

    /// Speed below which the quadratic drag term degrades to the linear form
    pub const DRAG_LINEAR_CUTOFF: f64 = 1.0;

    /// A push whose acceleration (force / mass) stays under this is absorbed
    pub const PUSH_ABSORB_THRESHOLD: f64 = 1.0;
}

/// Collision resolution constants
pub mod collision {
    /// Effective extra mass of a kinematic or static collision target
    pub const KINEMATIC_MASS_BONUS: f64 = 100_000.0;

    /// A contact normal pointing further down than this marks ground contact
    pub const REST_NORMAL_Y: f64 = -0.75;

    /// Speed at or under which a grounded body is put to rest
    pub const REST_SPEED: f64 = 0.1;
}

/// Narrow-phase (GJK / EPA) iteration caps and tolerances
pub mod narrow_phase {
    /// Simplex search gives up after this many support points
    pub const MAX_GJK_ITERATIONS: usize = 16;

    /// Polytope expansion gives up after this many faces
    pub const MAX_EPA_ITERATIONS: usize = 32;

    /// Convergence / degeneracy tolerance shared by GJK and EPA
    pub const EPSILON: f64 = 1e-4;

    /// Padding added to the reported penetration depth
    pub const DEPTH_PADDING: f64 = 1e-3;
}

/// Tick and stream pacing
pub mod timing {
    /// World simulation rate (ticks per second)
    pub const DEFAULT_TICK_RATE: u32 = 60;

    /// Default per-session stream rate (frames per second)
    pub const DEFAULT_SESSION_FPS: u32 = 60;
}

/// Arena and queue sizing
pub mod buffer_sizes {
    /// State-store block arena capacity in bytes
    pub const STATE_BUFFER_CAPACITY: usize = 1 << 20;

    /// Per-session copy buffer capacity in bytes
    pub const SESSION_BUFFER_CAPACITY: usize = 1 << 20;

    /// Deferred scene command queue depth
    pub const SCENE_QUEUE_CAPACITY: usize = 1000;

    /// In-flight frames per session before the stream starts dropping
    pub const SESSION_FRAME_QUEUE: usize = 2;
}

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Source device of an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDevice {
    Mouse,
    Keyboard,
}

/// Client input event, consumed from the transport as JSON.
///
/// Events are routed onto the deferred queue of the scene owning the
/// session's camera and dispatched at the next tick to every controller
/// on a descendant of that camera node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEvent {
    #[serde(default)]
    pub session_id: String,
    pub device: InputDevice,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub pressed: bool,
    #[serde(default)]
    pub scrolled: bool,
    #[serde(default)]
    pub delta: i32,
    #[serde(default)]
    pub delta_x: f32,
    #[serde(default)]
    pub delta_y: f32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl InputEvent {
    pub fn from_json(bytes: &[u8]) -> SimResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SimError::InvalidInput(e.to_string()))
    }
}

//! Error taxonomy for the simulation core.
//!
//! Session and input failures are recoverable and scoped to their source;
//! geometric degeneracies are logged at the collision site and degrade to
//! no-hit; arena exhaustion is a sizing bug and panics at the write site.
//! No error crosses a tick boundary.

pub type SimResult<T> = Result<T, SimError>;

/// Main error type for the simulation core
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Session-scoped transport failure; recovery is closing the session
    #[error("transport error on session {session}: {reason}")]
    Transport { session: String, reason: String },

    /// Malformed or unroutable input event; log and drop
    #[error("invalid input event: {0}")]
    InvalidInput(String),

    /// An operation referenced a session id that is not open
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The simulation has no current scene to attach a session to
    #[error("no scene attached to simulation")]
    SceneDetached,

    /// Non-fatal geometric degeneracy (GJK non-convergence, zero-area face)
    #[error("geometry degeneracy: {0}")]
    Degeneracy(String),

    /// Resource registration failure (palette overflow, bad color string)
    #[error("resource error: {0}")]
    Resource(String),
}

impl SimError {
    pub fn transport(session: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SimError::Transport {
            session: session.into(),
            reason: reason.to_string(),
        }
    }
}

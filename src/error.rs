//! Error kinds for speaker control and search-and-play

use thiserror::Error;

/// Why a control or playback action failed.
///
/// These never cross the action boundary: [`crate::integration::Integration`]
/// logs them and reports a plain success flag.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Music Assistant not available")]
    NotReady,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Invalid value for {command}: {reason}")]
    InvalidValue {
        command: &'static str,
        reason: String,
    },

    #[error(transparent)]
    External(#[from] anyhow::Error),
}

/// Config-flow validation failures
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot_connect")]
    CannotConnect,

    #[error("unknown")]
    Unknown(#[source] anyhow::Error),
}

impl SetupError {
    /// Error key reported to the config form (`errors["base"]`)
    pub fn key(&self) -> &'static str {
        match self {
            SetupError::CannotConnect => "cannot_connect",
            SetupError::Unknown(_) => "unknown",
        }
    }
}

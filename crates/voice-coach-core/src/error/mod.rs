use error_location::ErrorLocation;
use thiserror::Error;

/// Recording session errors with source location tracking.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Audio recording permission was denied at mount time.
    #[error("Audio recording permission denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No server URL has been configured; recording is disabled.
    #[error("Server URL not set {location}")]
    ServerUrlNotSet {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recorder or player device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceFailure {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No recorded audio is available for playback or submission.
    #[error("No recording available {location}")]
    NoRecordingAvailable {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Replay was requested before any TTS audio was produced.
    #[error("No TTS audio available {location}")]
    NoTtsAudio {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`SessionError`].
pub type Result<T> = std::result::Result<T, SessionError>;

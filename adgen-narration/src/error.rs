//! Error types for adgen-narration
//!
//! Every call into an external capability (speech synthesis, transcription,
//! acoustic feature extraction) returns `CapabilityResult<T>`. The validator
//! and retry controller fold these errors into verdict/outcome fields; none
//! of them escape `validate()` or `produce_validated_narration()`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Capability error
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Capability failed to initialize (missing model, missing API key)
    #[error("Capability not available: {0}")]
    Unavailable(String),

    /// Referenced audio file does not exist
    #[error("file not found")]
    ArtifactMissing(PathBuf),

    /// Call exceeded its configured timeout
    #[error("Timed out after {:.1}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Provider returned a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Audio decoding failed
    #[error("Audio decoding error: {0}")]
    Decode(String),

    /// Failed to parse provider response
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error (file read/write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CapabilityError {
    /// Whether a fresh attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CapabilityError::Unavailable(_))
    }
}

impl From<reqwest::Error> for CapabilityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CapabilityError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            CapabilityError::Parse(err.to_string())
        } else {
            CapabilityError::Network(err.to_string())
        }
    }
}

/// Result type for capability calls
pub type CapabilityResult<T> = Result<T, CapabilityError>;

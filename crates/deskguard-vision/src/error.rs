//! Error types for proximity sources.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while producing proximity samples.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Camera {index} could not be opened")]
    CameraUnavailable { index: i32 },

    #[error("Failed to read frame: {0}")]
    FrameReadFailed(String),

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Invalid trace at line {line}: {message}")]
    InvalidTrace { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create a frame read failure error.
    pub fn frame_read_failed(message: impl Into<String>) -> Self {
        Self::FrameReadFailed(message.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a trace error for a 1-based line number.
    pub fn invalid_trace(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidTrace {
            line,
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            VisionError::CameraUnavailable { index: 0 }.to_string(),
            "Camera 0 could not be opened"
        );
        assert_eq!(
            VisionError::invalid_trace(3, "time went backwards").to_string(),
            "Invalid trace at line 3: time went backwards"
        );
    }
}

//! Monitor error types.

use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Vision error: {0}")]
    Vision(#[from] deskguard_vision::VisionError),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the session ended because its proximity source broke.
    ///
    /// The driving application should stop the session and show the error
    /// to the user.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, MonitorError::Vision(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskguard_vision::VisionError;

    #[test]
    fn test_vision_errors_are_source_failures() {
        let err: MonitorError = VisionError::CameraUnavailable { index: 0 }.into();
        assert!(err.is_source_failure());
        assert_eq!(err.to_string(), "Vision error: Camera 0 could not be opened");
    }

    #[test]
    fn test_config_error_is_not_source_failure() {
        let err = MonitorError::config_error("bad threshold");
        assert!(!err.is_source_failure());
        assert_eq!(err.to_string(), "Configuration error: bad threshold");
    }
}

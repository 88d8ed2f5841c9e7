//! Monitoring session identity and proximity source selection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a monitoring session (one camera start/stop cycle).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where per-frame proximity ratios come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Live webcam with face detection.
    Camera,
    /// Recorded face detections replayed from a JSON-lines trace.
    Trace,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Camera => "camera",
            SourceKind::Trace => "trace",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = SourceKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "camera" | "webcam" => Ok(SourceKind::Camera),
            "trace" | "replay" => Ok(SourceKind::Trace),
            _ => Err(SourceKindParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown proximity source: {0}")]
pub struct SourceKindParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_str());
    }

    #[test]
    fn test_session_id_serializes_transparently() {
        let id = SessionId::from_string("session-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"session-1\"");
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("camera".parse::<SourceKind>().unwrap(), SourceKind::Camera);
        assert_eq!("Webcam".parse::<SourceKind>().unwrap(), SourceKind::Camera);
        assert_eq!(" trace ".parse::<SourceKind>().unwrap(), SourceKind::Trace);
        assert_eq!("replay".parse::<SourceKind>().unwrap(), SourceKind::Trace);
        assert!("microphone".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Camera.to_string(), "camera");
        assert_eq!(SourceKind::Trace.to_string(), "trace");
    }
}

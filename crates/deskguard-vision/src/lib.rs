#![deny(unreachable_patterns)]
//! Proximity sources for DeskGuard.
//!
//! This crate provides:
//! - Face bounding boxes and per-frame detections
//! - The face-width-to-frame-width proximity ratio
//! - The `ProximitySource` trait consumed by the monitoring loop
//! - Replay of recorded detections from JSON-lines traces
//! - Webcam capture with YuNet face detection (feature `opencv`)

#[cfg(feature = "opencv")]
pub mod camera;
pub mod error;
pub mod models;
pub mod proximity;
pub mod trace;

#[cfg(feature = "opencv")]
pub use camera::{CameraProximitySource, YuNetDetector};
pub use error::{VisionError, VisionResult};
pub use models::{BoundingBox, Detection, FrameDetections};
pub use proximity::{face_width_ratio, ProximitySample, ProximitySource};
pub use trace::TraceProximitySource;

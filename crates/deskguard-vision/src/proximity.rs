//! Proximity signal: how much of the frame the closest face fills.
//!
//! The ratio of face width to frame width is a dimensionless proxy for how
//! close the user sits to the screen. No calibration is involved.

use async_trait::async_trait;
use std::time::Instant;

use crate::error::VisionResult;
use crate::models::Detection;

/// Maximum face-width-to-frame-width ratio across all detections.
///
/// Returns 0.0 when no face was detected or the frame width is zero.
/// Degenerate boxes (non-positive or non-finite width) are ignored.
pub fn face_width_ratio(detections: &[Detection], frame_width: u32) -> f64 {
    detections
        .iter()
        .map(|d| d.bbox.relative_width(frame_width))
        .fold(0.0, f64::max)
}

/// One proximity reading taken from a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximitySample {
    /// Closest-face ratio for the frame (0.0 when no face was found).
    pub ratio: f64,
    /// Monotonic instant at which the frame was captured.
    pub captured_at: Instant,
    /// Number of faces detected in the frame.
    pub face_count: usize,
}

impl ProximitySample {
    /// Build a sample from raw detections.
    pub fn from_detections(detections: &[Detection], frame_width: u32, captured_at: Instant) -> Self {
        Self {
            ratio: face_width_ratio(detections, frame_width),
            captured_at,
            face_count: detections.len(),
        }
    }
}

/// Source of per-frame proximity samples.
///
/// Wraps capture plus face detection behind a uniform interface so the
/// monitoring loop does not care whether frames come from a webcam or a
/// recording.
#[async_trait]
pub trait ProximitySource: Send {
    /// Produce the next sample.
    ///
    /// # Returns
    /// `Ok(None)` once the source is exhausted (end of a recording).
    async fn next_sample(&mut self) -> VisionResult<Option<ProximitySample>>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

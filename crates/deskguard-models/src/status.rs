//! Per-frame status published to the rendering layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status message shown while the user is at a comfortable distance.
pub const POSTURE_OK_MESSAGE: &str = "Posture OK";

/// What the UI needs to render a single evaluated frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameStatus {
    /// Zero-based index of the frame within its session.
    pub frame_index: u64,
    /// Proximity ratio reported for the frame (0.0 when no face was found).
    pub ratio: f64,
    /// Whether the ratio exceeded the distance threshold.
    pub is_too_close: bool,
    /// Human-readable status line.
    pub message: String,
    /// Whether an alert fired on this frame.
    pub alert_fired: bool,
    /// Seconds since the current too-close streak began.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
}

impl FrameStatus {
    /// Overlay color for the frame, as a CSS-style name.
    pub fn overlay_color(&self) -> &'static str {
        if self.is_too_close {
            "red"
        } else {
            "green"
        }
    }

    /// Ratio formatted the way the dashboard metric shows it.
    pub fn ratio_label(&self) -> String {
        format!("{:.3}", self.ratio)
    }
}

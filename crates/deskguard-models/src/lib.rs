//! Shared data models for DeskGuard.
//!
//! This crate provides Serde-serializable types for:
//! - Alert thresholds and dashboard control ranges
//! - Session identity and proximity source selection
//! - Per-frame status for the rendering layer
//! - Proximity history records and chart points

pub mod history;
pub mod session;
pub mod status;
pub mod thresholds;

// Re-export common types
pub use history::{ChartPoint, HistoryRecord};
pub use session::{SessionId, SourceKind, SourceKindParseError};
pub use status::{FrameStatus, POSTURE_OK_MESSAGE};
pub use thresholds::{
    AlertThresholds, SliderRange, COOLDOWN_SLIDER, DISTANCE_SLIDER, TIME_BUFFER_SLIDER,
};

//! Monitor configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use deskguard_models::{AlertThresholds, SourceKind};
use tracing::warn;

use crate::error::{MonitorError, MonitorResult};

/// Default YuNet model location, relative to the working directory.
pub const DEFAULT_YUNET_MODEL: &str = "models/face_detection_yunet_2023mar.onnx";

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Initial alert thresholds (may be retuned while a session runs)
    pub thresholds: AlertThresholds,
    /// Where proximity samples come from
    pub source: SourceKind,
    /// JSON-lines trace to replay when `source` is `Trace`
    pub trace_path: Option<PathBuf>,
    /// Replay traces at their recorded pace instead of as fast as possible
    pub trace_realtime: bool,
    /// Webcam index when `source` is `Camera`
    pub camera_index: i32,
    /// YuNet ONNX model used for camera face detection
    pub yunet_model: PathBuf,
    /// Pause between frames
    pub frame_interval: Duration,
    /// Maximum number of history records kept per session
    pub history_capacity: usize,
    /// Minimum spacing between history records
    pub history_interval: Duration,
    /// Where to write the session history as JSON when the session ends
    pub history_path: Option<PathBuf>,
    /// Ring the terminal bell on alerts
    pub beep: bool,
    /// Port for the Prometheus exporter (disabled when `None`)
    pub metrics_port: Option<u16>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::dashboard(),
            source: default_source(),
            trace_path: None,
            trace_realtime: true,
            camera_index: 0,
            yunet_model: PathBuf::from(DEFAULT_YUNET_MODEL),
            frame_interval: Duration::from_millis(10),
            history_capacity: 3600, // one hour at one record per second
            history_interval: Duration::from_millis(1000),
            history_path: None,
            beep: true,
            metrics_port: None,
        }
    }
}

fn default_source() -> SourceKind {
    if cfg!(feature = "opencv") {
        SourceKind::Camera
    } else {
        SourceKind::Trace
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl MonitorConfig {
    /// Create config from environment variables.
    ///
    /// Unparseable values fall back to defaults, except `DESKGUARD_SOURCE`
    /// which must name a known source. Thresholds are snapped into the
    /// dashboard slider ranges.
    pub fn from_env() -> MonitorResult<Self> {
        let defaults = Self::default();

        let source = match std::env::var("DESKGUARD_SOURCE") {
            Ok(s) => s
                .parse::<SourceKind>()
                .map_err(|e| MonitorError::config_error(e.to_string()))?,
            Err(_) => defaults.source,
        };

        let metrics_port = std::env::var("DESKGUARD_METRICS_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok());

        let requested = AlertThresholds {
            distance_threshold: env_parse(
                "DESKGUARD_DISTANCE_THRESHOLD",
                defaults.thresholds.distance_threshold,
            ),
            time_threshold: env_parse(
                "DESKGUARD_TIME_THRESHOLD",
                defaults.thresholds.time_threshold,
            ),
            cooldown: env_parse("DESKGUARD_COOLDOWN", defaults.thresholds.cooldown),
        };
        let thresholds = requested.clamped_to_sliders();
        if thresholds != requested {
            warn!(?requested, ?thresholds, "Thresholds outside the dashboard ranges were adjusted");
        }

        Ok(Self {
            thresholds,
            source,
            trace_path: std::env::var("DESKGUARD_TRACE_PATH").ok().map(PathBuf::from),
            trace_realtime: env_bool("DESKGUARD_TRACE_REALTIME", defaults.trace_realtime),
            camera_index: env_parse("DESKGUARD_CAMERA_INDEX", defaults.camera_index),
            yunet_model: std::env::var("DESKGUARD_YUNET_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.yunet_model),
            frame_interval: Duration::from_millis(env_parse("DESKGUARD_FRAME_INTERVAL_MS", 10)),
            history_capacity: env_parse("DESKGUARD_HISTORY_CAPACITY", defaults.history_capacity),
            history_interval: Duration::from_millis(env_parse("DESKGUARD_HISTORY_INTERVAL_MS", 1000)),
            history_path: std::env::var("DESKGUARD_HISTORY_PATH").ok().map(PathBuf::from),
            beep: env_bool("DESKGUARD_BEEP", defaults.beep),
            metrics_port,
        })
    }

    /// Check that the configuration can start a session.
    pub fn validate(&self) -> MonitorResult<()> {
        self.thresholds
            .validate()
            .map_err(MonitorError::config_error)?;

        match self.source {
            SourceKind::Trace if self.trace_path.is_none() => Err(MonitorError::config_error(
                "DESKGUARD_TRACE_PATH is required for the trace source",
            )),
            SourceKind::Camera if !cfg!(feature = "opencv") => Err(MonitorError::config_error(
                "camera source requires building with the `opencv` feature",
            )),
            _ => Ok(()),
        }
    }

    /// Builder-style setter for thresholds.
    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Builder-style setter for a trace source.
    pub fn with_trace(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = SourceKind::Trace;
        self.trace_path = Some(path.into());
        self
    }
}

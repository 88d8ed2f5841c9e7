//! Monitoring metrics.
//!
//! Recording is a no-op until a recorder is installed; the binary installs
//! a Prometheus exporter when a metrics port is configured.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{MonitorError, MonitorResult};

/// Metric name constants for consistency.
pub mod names {
    /// Frames evaluated, by source.
    pub const FRAMES_TOTAL: &str = "deskguard_frames_total";

    /// Alerts fired, by source.
    pub const ALERTS_TOTAL: &str = "deskguard_alerts_total";

    /// Proximity ratio per frame.
    pub const PROXIMITY_RATIO: &str = "deskguard_proximity_ratio";

    /// 1 while the user is too close, 0 otherwise.
    pub const TOO_CLOSE: &str = "deskguard_too_close";

    /// Sessions ended, by outcome.
    pub const SESSIONS_TOTAL: &str = "deskguard_sessions_total";
}

/// Install the Prometheus exporter with an HTTP listener on `port`.
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus(port: u16) -> MonitorResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MonitorError::Metrics(e.to_string()))
}

/// Record one evaluated frame.
pub fn record_frame(source: &'static str, ratio: f64, too_close: bool) {
    counter!(names::FRAMES_TOTAL, "source" => source).increment(1);
    histogram!(names::PROXIMITY_RATIO, "source" => source).record(ratio);
    gauge!(names::TOO_CLOSE, "source" => source).set(if too_close { 1.0 } else { 0.0 });
}

/// Record a fired alert.
pub fn record_alert(source: &'static str) {
    counter!(names::ALERTS_TOTAL, "source" => source).increment(1);
}

/// Record the end of a session.
pub fn record_session_end(outcome: &'static str) {
    counter!(names::SESSIONS_TOTAL, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::FRAMES_TOTAL.starts_with("deskguard_"));
        assert!(names::ALERTS_TOTAL.ends_with("_total"));
        assert!(names::PROXIMITY_RATIO.contains("ratio"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_frame("test", 0.4, true);
        record_alert("test");
        record_session_end("stopped");
    }
}

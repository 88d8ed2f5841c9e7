//! Posture monitoring for DeskGuard.
//!
//! This crate provides:
//! - The alert evaluator that turns proximity ratios into alerts
//! - Notification sinks (terminal bell, log line, fan-out)
//! - Monitoring sessions with live threshold updates and graceful stop
//! - Session history for charting
//! - Configuration, structured logging and Prometheus metrics

pub mod config;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod notify;
pub mod session;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use evaluator::{AlertEvaluator, Evaluation, ProximityState};
pub use history::HistoryLog;
pub use logging::SessionLogger;
pub use notify::{BeepNotifier, CountingNotifier, FanoutNotifier, NotificationSink, TracingNotifier};
pub use session::{MonitorSession, SessionControl, SessionEndReason, SessionSummary};

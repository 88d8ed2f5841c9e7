//! Structured session logging utilities.
//!
//! Provides consistent, structured logging for monitoring sessions with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deskguard_models::SessionId;

/// Initialize tracing: colored output for dev, JSON when `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("deskguard=info,deskguard_monitor=info,deskguard_vision=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Session logger for structured logging with consistent formatting.
///
/// Attaches the session ID and the proximity source name to every event.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    source: String,
}

impl SessionLogger {
    /// Create a new session logger.
    ///
    /// # Arguments
    /// * `session_id` - The unique identifier for the session
    /// * `source` - The proximity source name (e.g., "camera", "trace")
    pub fn new(session_id: &SessionId, source: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            source: source.to_string(),
        }
    }

    /// Log the start of a session.
    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            "Session started: {}", message
        );
    }

    /// Log a closeness transition or other progress.
    pub fn log_progress(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            "Session progress: {}", message
        );
    }

    /// Log a fired alert.
    pub fn log_alert(&self, ratio: f64, elapsed_secs: f64) {
        warn!(
            session_id = %self.session_id,
            source = %self.source,
            ratio,
            elapsed_secs,
            "Too close for {:.1}s, alert fired", elapsed_secs
        );
    }

    /// Log an error that ends the session.
    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            source = %self.source,
            "Session error: {}", message
        );
    }

    /// Log the end of a session.
    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            source = %self.source,
            "Session stopped: {}", message
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Create a tracing span for this session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            source = %self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_logger_creation() {
        let session_id = SessionId::new();
        let logger = SessionLogger::new(&session_id, "trace");

        assert_eq!(logger.session_id(), session_id.to_string());
        assert_eq!(logger.source(), "trace");
    }

    #[test]
    fn test_session_logger_methods_do_not_panic_without_subscriber() {
        let logger = SessionLogger::new(&SessionId::from_string("s-1"), "camera");
        let _span = logger.create_span().entered();

        logger.log_start("thresholds 0.25/3.0/5.0");
        logger.log_progress("too close");
        logger.log_alert(0.41, 3.2);
        logger.log_error("camera unplugged");
        logger.log_completion("3 alerts");
    }
}

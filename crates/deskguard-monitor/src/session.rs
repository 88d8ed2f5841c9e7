//! Monitoring session: the loop that drives the alert evaluator.
//!
//! A session is owned by whoever runs it. It is started by calling
//! [`MonitorSession::run`] and ends when its [`SessionControl`] is told to
//! stop, when the proximity source runs dry, or when the source fails.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, Instrument};

use deskguard_models::{AlertThresholds, FrameStatus, SessionId};
use deskguard_vision::ProximitySource;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::evaluator::AlertEvaluator;
use crate::history::HistoryLog;
use crate::logging::SessionLogger;
use crate::metrics;
use crate::notify::NotificationSink;

/// Why a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// `SessionControl::stop` was called.
    Stopped,
    /// The proximity source has no more samples.
    SourceExhausted,
}

impl SessionEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEndReason::Stopped => "stopped",
            SessionEndReason::SourceExhausted => "source_exhausted",
        }
    }
}

/// What a finished session leaves behind.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub end_reason: SessionEndReason,
    /// Frames evaluated
    pub frames: u64,
    /// Alerts fired
    pub alerts: u64,
    /// Highest proximity ratio seen
    pub peak_ratio: f64,
    pub history: HistoryLog,
}

struct ControlChannels {
    shutdown: watch::Sender<bool>,
    thresholds: watch::Sender<AlertThresholds>,
    status: watch::Sender<Option<FrameStatus>>,
}

/// Handle for stopping and retuning a running session.
#[derive(Clone)]
pub struct SessionControl {
    channels: Arc<ControlChannels>,
}

impl SessionControl {
    /// Ask the session to stop. Idempotent.
    pub fn stop(&self) {
        self.channels.shutdown.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.channels.shutdown.borrow()
    }

    /// Replace the thresholds; the session applies them on its next frame.
    ///
    /// The in-progress streak and cooldown are kept as they are.
    pub fn update_thresholds(&self, thresholds: AlertThresholds) -> MonitorResult<()> {
        thresholds.validate().map_err(MonitorError::config_error)?;
        self.channels.thresholds.send_replace(thresholds);
        Ok(())
    }

    /// Thresholds most recently requested.
    pub fn thresholds(&self) -> AlertThresholds {
        *self.channels.thresholds.borrow()
    }

    /// Receive the status of every evaluated frame (latest value only).
    pub fn subscribe_status(&self) -> watch::Receiver<Option<FrameStatus>> {
        self.channels.status.subscribe()
    }

    /// Status of the most recent frame, if any.
    pub fn latest_status(&self) -> Option<FrameStatus> {
        self.channels.status.borrow().clone()
    }
}

/// One monitoring session.
pub struct MonitorSession {
    id: SessionId,
    config: MonitorConfig,
    evaluator: AlertEvaluator,
    control: SessionControl,
    shutdown_rx: watch::Receiver<bool>,
    thresholds_rx: watch::Receiver<AlertThresholds>,
}

impl MonitorSession {
    /// Create a session and its control handle.
    pub fn new(config: MonitorConfig, notifier: Box<dyn NotificationSink>) -> (Self, SessionControl) {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (thresholds, thresholds_rx) = watch::channel(config.thresholds);
        let (status, _) = watch::channel(None);

        let control = SessionControl {
            channels: Arc::new(ControlChannels {
                shutdown,
                thresholds,
                status,
            }),
        };

        let session = Self {
            id: SessionId::new(),
            evaluator: AlertEvaluator::new(config.thresholds, notifier),
            config,
            control: control.clone(),
            shutdown_rx,
            thresholds_rx,
        };

        (session, control)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Run until stopped, until the source is exhausted, or until it fails.
    ///
    /// A source error ends the session and is returned to the caller.
    pub async fn run<S>(self, source: &mut S) -> MonitorResult<SessionSummary>
    where
        S: ProximitySource + ?Sized,
    {
        let logger = SessionLogger::new(&self.id, source.name());
        let span = logger.create_span();
        self.run_loop(source, logger).instrument(span).await
    }

    async fn run_loop<S>(mut self, source: &mut S, logger: SessionLogger) -> MonitorResult<SessionSummary>
    where
        S: ProximitySource + ?Sized,
    {
        let source_name = source.name();
        let thresholds = self.evaluator.thresholds();
        logger.log_start(&format!(
            "distance_threshold={} time_threshold={}s cooldown={}s",
            thresholds.distance_threshold, thresholds.time_threshold, thresholds.cooldown
        ));

        let mut history: Option<HistoryLog> = None;
        let mut frames: u64 = 0;
        let mut alerts: u64 = 0;
        let mut peak_ratio: f64 = 0.0;
        let mut was_close = false;

        let outcome = loop {
            if *self.shutdown_rx.borrow_and_update() {
                break Ok(SessionEndReason::Stopped);
            }

            let next = tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => continue,
                result = source.next_sample() => result,
            };

            let sample = match next {
                Ok(Some(sample)) => sample,
                Ok(None) => break Ok(SessionEndReason::SourceExhausted),
                Err(e) => break Err(MonitorError::from(e)),
            };

            if self.thresholds_rx.has_changed().unwrap_or(false) {
                let thresholds = *self.thresholds_rx.borrow_and_update();
                self.evaluator.set_thresholds(thresholds);
                logger.log_progress(&format!(
                    "thresholds updated: distance_threshold={} time_threshold={}s cooldown={}s",
                    thresholds.distance_threshold, thresholds.time_threshold, thresholds.cooldown
                ));
            }

            let evaluation = self.evaluator.update(sample.ratio, sample.captured_at);

            if evaluation.is_too_close != was_close {
                logger.log_progress(if evaluation.is_too_close {
                    "too close"
                } else {
                    "back to a comfortable distance"
                });
                was_close = evaluation.is_too_close;
            }
            if evaluation.should_alert {
                alerts += 1;
                metrics::record_alert(source_name);
                logger.log_alert(sample.ratio, evaluation.elapsed_secs.unwrap_or_default());
            }
            metrics::record_frame(source_name, sample.ratio, evaluation.is_too_close);

            history
                .get_or_insert_with(|| {
                    HistoryLog::new(
                        self.config.history_capacity,
                        self.config.history_interval,
                        sample.captured_at,
                    )
                })
                .record(sample.captured_at, sample.ratio, evaluation.is_too_close);

            debug!(
                frame = frames,
                ratio = sample.ratio,
                faces = sample.face_count,
                "{}",
                evaluation.message
            );

            self.control.channels.status.send_replace(Some(FrameStatus {
                frame_index: frames,
                ratio: sample.ratio,
                is_too_close: evaluation.is_too_close,
                message: evaluation.message,
                alert_fired: evaluation.should_alert,
                elapsed_secs: evaluation.elapsed_secs,
            }));

            frames += 1;
            peak_ratio = peak_ratio.max(sample.ratio);

            if !self.config.frame_interval.is_zero() {
                tokio::select! {
                    _ = self.shutdown_rx.changed() => {}
                    _ = tokio::time::sleep(self.config.frame_interval) => {}
                }
            }
        };

        match outcome {
            Ok(end_reason) => {
                metrics::record_session_end(end_reason.as_str());
                logger.log_completion(&format!(
                    "{} after {} frames, {} alerts",
                    end_reason.as_str(),
                    frames,
                    alerts
                ));
                Ok(SessionSummary {
                    session_id: self.id,
                    end_reason,
                    frames,
                    alerts,
                    peak_ratio,
                    history: history.unwrap_or_else(|| {
                        HistoryLog::new(
                            self.config.history_capacity,
                            self.config.history_interval,
                            Instant::now(),
                        )
                    }),
                })
            }
            Err(e) => {
                metrics::record_session_end("failed");
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }
}

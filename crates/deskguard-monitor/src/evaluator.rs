//! Debounced, cooldown-gated proximity alerts.
//!
//! The evaluator turns a stream of `(ratio, instant)` samples into alert
//! decisions. It performs no I/O apart from calling its notification sink
//! when an alert fires.
//!
//! ```text
//!   FAR ──(ratio > threshold)──▶ CLOSE(now)
//!   CLOSE(since) ──(ratio > threshold)──▶ CLOSE(since)   [may fire]
//!   CLOSE ──(ratio <= threshold)──▶ FAR
//!   FAR ──(ratio <= threshold)──▶ FAR
//! ```

use std::time::Instant;

use deskguard_models::{AlertThresholds, POSTURE_OK_MESSAGE};

use crate::notify::NotificationSink;

/// Closeness state of the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityState {
    /// Not too close; no streak in progress.
    Far,
    /// Too close since the given instant.
    Close { since: Instant },
}

/// Outcome of a single update.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub is_too_close: bool,
    pub message: String,
    pub should_alert: bool,
    /// Dwell time of the current streak, `None` when not too close.
    pub elapsed_secs: Option<f64>,
}

impl Evaluation {
    /// `(is_too_close, message, should_alert)`
    pub fn as_tuple(&self) -> (bool, &str, bool) {
        (self.is_too_close, &self.message, self.should_alert)
    }
}

/// Alert state machine for one monitoring session.
///
/// Not shareable across threads: the session that owns it must serialize
/// calls to [`AlertEvaluator::update`].
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    state: ProximityState,
    /// `None` means no alert has fired yet, so cooldown never blocks the first.
    last_alert_at: Option<Instant>,
    notifier: Box<dyn NotificationSink>,
}

impl AlertEvaluator {
    pub fn new(thresholds: AlertThresholds, notifier: Box<dyn NotificationSink>) -> Self {
        Self {
            thresholds,
            state: ProximityState::Far,
            last_alert_at: None,
            notifier,
        }
    }

    /// Evaluate one sample.
    ///
    /// `now` must not decrease between calls. If it does, elapsed times
    /// saturate at zero instead of panicking.
    pub fn update(&mut self, ratio: f64, now: Instant) -> Evaluation {
        let is_too_close = ratio > self.thresholds.distance_threshold;

        if !is_too_close {
            self.state = ProximityState::Far;
            return Evaluation {
                is_too_close: false,
                message: POSTURE_OK_MESSAGE.to_string(),
                should_alert: false,
                elapsed_secs: None,
            };
        }

        let since = match self.state {
            ProximityState::Close { since } => since,
            ProximityState::Far => {
                self.state = ProximityState::Close { since: now };
                now
            }
        };

        let elapsed = now.saturating_duration_since(since).as_secs_f64();
        let should_alert = elapsed >= self.thresholds.time_threshold && self.cooldown_elapsed(now);

        if should_alert {
            self.last_alert_at = Some(now);
            self.notifier.notify();
        }

        Evaluation {
            is_too_close: true,
            message: format!("Too Close! ({:.1}s)", elapsed),
            should_alert,
            elapsed_secs: Some(elapsed),
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_alert_at {
            None => true,
            Some(last) => now.saturating_duration_since(last).as_secs_f64() >= self.thresholds.cooldown,
        }
    }

    /// Replace the thresholds. Takes effect on the next update and leaves the
    /// current streak and cooldown untouched.
    pub fn set_thresholds(&mut self, thresholds: AlertThresholds) {
        self.thresholds = thresholds;
    }

    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    pub fn state(&self) -> ProximityState {
        self.state
    }

    pub fn last_alert_at(&self) -> Option<Instant> {
        self.last_alert_at
    }

    /// Dwell time of the current streak at `now`, if one is in progress.
    pub fn streak_elapsed(&self, now: Instant) -> Option<f64> {
        match self.state {
            ProximityState::Far => None,
            ProximityState::Close { since } => Some(now.saturating_duration_since(since).as_secs_f64()),
        }
    }
}

impl std::fmt::Debug for AlertEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEvaluator")
            .field("thresholds", &self.thresholds)
            .field("state", &self.state)
            .field("last_alert_at", &self.last_alert_at)
            .field("notifier", &self.notifier.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CountingNotifier;
    use std::time::Duration;

    fn evaluator(thresholds: AlertThresholds) -> (AlertEvaluator, CountingNotifier) {
        let notifier = CountingNotifier::new();
        let evaluator = AlertEvaluator::new(thresholds, Box::new(notifier.clone()));
        (evaluator, notifier)
    }

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    #[test]
    fn test_far_ratio_reports_posture_ok() {
        let (mut eval, notifier) = evaluator(AlertThresholds::default());
        let base = Instant::now();

        for (i, ratio) in [0.0, 0.1, 0.3].iter().enumerate() {
            let result = eval.update(*ratio, at(base, i as f64));
            assert_eq!(result.as_tuple(), (false, "Posture OK", false));
            assert_eq!(result.elapsed_secs, None);
        }
        assert_eq!(eval.state(), ProximityState::Far);
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let (mut eval, _) = evaluator(AlertThresholds::default());
        let result = eval.update(0.3, Instant::now());
        assert!(!result.is_too_close);

        let result = eval.update(0.3000001, Instant::now());
        assert!(result.is_too_close);
    }

    #[test]
    fn test_far_resets_streak_regardless_of_prior_state() {
        let (mut eval, _) = evaluator(AlertThresholds::default());
        let base = Instant::now();

        eval.update(0.5, base);
        assert_eq!(eval.state(), ProximityState::Close { since: base });

        let result = eval.update(0.2, at(base, 1.0));
        assert_eq!(result.message, "Posture OK");
        assert_eq!(eval.state(), ProximityState::Far);
        assert_eq!(eval.streak_elapsed(at(base, 2.0)), None);
    }

    #[test]
    fn test_continuous_closeness_scenario() {
        let (mut eval, notifier) = evaluator(AlertThresholds::new(0.3, 3.0, 5.0));
        let base = Instant::now();

        let alerts: Vec<bool> = (0..5)
            .map(|t| eval.update(0.5, at(base, t as f64)).should_alert)
            .collect();

        assert_eq!(alerts, vec![false, false, false, true, false]);
        assert_eq!(notifier.count(), 1);
        assert_eq!(eval.last_alert_at(), Some(at(base, 3.0)));
    }

    #[test]
    fn test_message_formats_elapsed_seconds() {
        let (mut eval, _) = evaluator(AlertThresholds::default());
        let base = Instant::now();

        assert_eq!(eval.update(0.5, base).message, "Too Close! (0.0s)");
        assert_eq!(eval.update(0.5, at(base, 1.26)).message, "Too Close! (1.3s)");
        assert_eq!(eval.update(0.5, at(base, 2.0)).elapsed_secs, Some(2.0));
    }

    #[test]
    fn test_interrupted_streak_restarts_timer() {
        let (mut eval, notifier) = evaluator(AlertThresholds::new(0.3, 3.0, 5.0));
        let base = Instant::now();

        for t in [0.0, 1.0, 2.0] {
            assert!(!eval.update(0.5, at(base, t)).should_alert);
        }
        assert!(!eval.update(0.1, at(base, 2.5)).is_too_close);

        for t in [3.0, 4.0, 5.0, 5.9] {
            assert!(!eval.update(0.5, at(base, t)).should_alert, "fired early at t={}", t);
        }

        let result = eval.update(0.5, at(base, 6.0));
        assert!(result.should_alert);
        assert_eq!(result.elapsed_secs, Some(3.0));
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn test_cooldown_suppresses_repeat_alerts() {
        let (mut eval, notifier) = evaluator(AlertThresholds::new(0.3, 1.0, 5.0));
        let base = Instant::now();

        let mut fired_at = Vec::new();
        for step in 0..=24 {
            let t = step as f64 * 0.5;
            if eval.update(0.6, at(base, t)).should_alert {
                fired_at.push(t);
            }
        }

        assert_eq!(fired_at, vec![1.0, 6.0, 11.0]);
        assert_eq!(notifier.count(), 3);
    }

    #[test]
    fn test_cooldown_survives_far_interruptions() {
        let (mut eval, notifier) = evaluator(AlertThresholds::new(0.3, 0.0, 5.0));
        let base = Instant::now();

        assert!(eval.update(0.5, base).should_alert);
        eval.update(0.0, at(base, 1.0));
        assert!(!eval.update(0.5, at(base, 2.0)).should_alert);
        assert!(eval.update(0.5, at(base, 5.0)).should_alert);
        assert_eq!(notifier.count(), 2);
    }

    #[test]
    fn test_zero_time_threshold_fires_on_entry() {
        let (mut eval, _) = evaluator(AlertThresholds::new(0.3, 0.0, 5.0));
        let result = eval.update(0.4, Instant::now());
        assert!(result.should_alert);
        assert_eq!(result.message, "Too Close! (0.0s)");
    }

    #[test]
    fn test_repeated_far_updates_are_idempotent() {
        let (mut eval, notifier) = evaluator(AlertThresholds::new(0.3, 0.0, 0.0));
        let base = Instant::now();

        let results: Vec<Evaluation> = (0..50).map(|t| eval.update(0.0, at(base, t as f64))).collect();

        assert!(results.iter().all(|r| r == &results[0]));
        assert!(!results[0].should_alert);
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_threshold_change_keeps_streak() {
        let (mut eval, notifier) = evaluator(AlertThresholds::new(0.3, 10.0, 5.0));
        let base = Instant::now();

        assert!(!eval.update(0.5, base).should_alert);
        assert!(!eval.update(0.5, at(base, 2.0)).should_alert);

        eval.set_thresholds(AlertThresholds::new(0.3, 1.0, 5.0));
        assert_eq!(eval.state(), ProximityState::Close { since: base });

        let result = eval.update(0.5, at(base, 2.5));
        assert!(result.should_alert);
        assert_eq!(result.elapsed_secs, Some(2.5));
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn test_raising_distance_threshold_ends_streak() {
        let (mut eval, _) = evaluator(AlertThresholds::new(0.3, 3.0, 5.0));
        let base = Instant::now();

        eval.update(0.4, base);
        eval.set_thresholds(AlertThresholds::new(0.45, 3.0, 5.0));

        let result = eval.update(0.4, at(base, 1.0));
        assert!(!result.is_too_close);
        assert_eq!(eval.state(), ProximityState::Far);
    }

    #[test]
    fn test_backwards_clock_does_not_panic() {
        let (mut eval, _) = evaluator(AlertThresholds::default());
        let base = Instant::now();

        eval.update(0.5, at(base, 5.0));
        let result = eval.update(0.5, base);
        assert_eq!(result.elapsed_secs, Some(0.0));
    }
}

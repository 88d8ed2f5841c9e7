//! Alert thresholds and the adjustable-control ranges exposed to the dashboard.
//!
//! Thresholds are plain values: the evaluator reads them on every update, so a
//! change made between two frames takes effect on the very next frame.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Thresholds controlling when the user counts as "too close" and when an
/// alert may fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AlertThresholds {
    /// Face-width-to-frame-width ratio above which the user is too close.
    ///
    /// Higher values mean the face must fill more of the frame before the
    /// user counts as too close. A ratio exactly equal to the threshold is
    /// not too close.
    pub distance_threshold: f64,

    /// Seconds of continuous closeness required before an alert may fire.
    pub time_threshold: f64,

    /// Minimum seconds between two fired alerts.
    pub cooldown: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            distance_threshold: 0.3,
            time_threshold: 3.0,
            cooldown: 5.0,
        }
    }
}

impl AlertThresholds {
    /// Create thresholds from explicit values.
    pub fn new(distance_threshold: f64, time_threshold: f64, cooldown: f64) -> Self {
        Self {
            distance_threshold,
            time_threshold,
            cooldown,
        }
    }

    /// Defaults used by the dashboard controls.
    ///
    /// The dashboard starts slightly more sensitive than the evaluator's own
    /// defaults (0.25 instead of 0.3).
    pub fn dashboard() -> Self {
        Self {
            distance_threshold: DISTANCE_SLIDER.default,
            time_threshold: TIME_BUFFER_SLIDER.default,
            cooldown: COOLDOWN_SLIDER.default,
        }
    }

    /// Builder-style setter for the distance threshold.
    pub fn with_distance_threshold(mut self, threshold: f64) -> Self {
        self.distance_threshold = threshold;
        self
    }

    /// Builder-style setter for the dwell time threshold.
    pub fn with_time_threshold(mut self, seconds: f64) -> Self {
        self.time_threshold = seconds;
        self
    }

    /// Builder-style setter for the alert cooldown.
    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.cooldown = seconds;
        self
    }

    /// Snap every threshold into its dashboard control range.
    pub fn clamped_to_sliders(self) -> Self {
        Self {
            distance_threshold: DISTANCE_SLIDER.clamp(self.distance_threshold),
            time_threshold: TIME_BUFFER_SLIDER.clamp(self.time_threshold),
            cooldown: COOLDOWN_SLIDER.clamp(self.cooldown),
        }
    }

    /// Validate the thresholds.
    ///
    /// Only structural problems are rejected; values outside the dashboard
    /// slider ranges are still accepted.
    pub fn validate(&self) -> Result<(), String> {
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(format!(
                "distance_threshold must be a positive number, got {}",
                self.distance_threshold
            ));
        }
        if !self.time_threshold.is_finite() || self.time_threshold < 0.0 {
            return Err(format!(
                "time_threshold must be a non-negative number of seconds, got {}",
                self.time_threshold
            ));
        }
        if !self.cooldown.is_finite() || self.cooldown < 0.0 {
            return Err(format!(
                "cooldown must be a non-negative number of seconds, got {}",
                self.cooldown
            ));
        }
        Ok(())
    }
}

/// Range and step of an adjustable dashboard control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl SliderRange {
    /// Clamp a value into the range and snap it to the nearest step.
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 || clamped == self.min || clamped == self.max {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }
}

/// Distance sensitivity control (face ratio).
pub const DISTANCE_SLIDER: SliderRange = SliderRange {
    min: 0.1,
    max: 0.5,
    step: 0.01,
    default: 0.25,
};

/// Time buffer control (seconds close before alerting).
pub const TIME_BUFFER_SLIDER: SliderRange = SliderRange {
    min: 1.0,
    max: 10.0,
    step: 0.5,
    default: 3.0,
};

/// Alert cooldown control (seconds).
pub const COOLDOWN_SLIDER: SliderRange = SliderRange {
    min: 1.0,
    max: 10.0,
    step: 0.5,
    default: 5.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = AlertThresholds::default();
        assert_eq!(thresholds.distance_threshold, 0.3);
        assert_eq!(thresholds.time_threshold, 3.0);
        assert_eq!(thresholds.cooldown, 5.0);
    }

    #[test]
    fn test_dashboard_thresholds() {
        let thresholds = AlertThresholds::dashboard();
        assert_eq!(thresholds.distance_threshold, 0.25);
        assert_eq!(thresholds.time_threshold, 3.0);
        assert_eq!(thresholds.cooldown, 5.0);
    }

    #[test]
    fn test_builder_pattern() {
        let thresholds = AlertThresholds::default()
            .with_distance_threshold(0.4)
            .with_time_threshold(1.5)
            .with_cooldown(0.0);

        assert_eq!(thresholds, AlertThresholds::new(0.4, 1.5, 0.0));
        assert!(thresholds.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(AlertThresholds::default().with_distance_threshold(0.0).validate().is_err());
        assert!(AlertThresholds::default().with_distance_threshold(f64::NAN).validate().is_err());
        assert!(AlertThresholds::default().with_time_threshold(-1.0).validate().is_err());
        assert!(AlertThresholds::default().with_cooldown(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_validation_accepts_values_outside_sliders() {
        let thresholds = AlertThresholds::new(0.9, 30.0, 0.0);
        assert!(thresholds.validate().is_ok());
    }

    #[test]
    fn test_slider_clamping() {
        assert_eq!(DISTANCE_SLIDER.clamp(0.9), 0.5);
        assert_eq!(TIME_BUFFER_SLIDER.clamp(0.2), 1.0);
        assert_eq!(COOLDOWN_SLIDER.clamp(f64::NAN), 5.0);
        assert!((TIME_BUFFER_SLIDER.clamp(3.3) - 3.5).abs() < 1e-9);
        assert!((DISTANCE_SLIDER.clamp(0.333) - 0.33).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_to_sliders() {
        let thresholds = AlertThresholds::new(0.05, 12.0, 0.0).clamped_to_sliders();
        assert_eq!(thresholds.distance_threshold, 0.1);
        assert_eq!(thresholds.time_threshold, 10.0);
        assert_eq!(thresholds.cooldown, 1.0);
    }
}

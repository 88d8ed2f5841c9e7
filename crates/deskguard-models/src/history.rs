//! Proximity history records and chart data.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One throttled sample of the proximity history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistoryRecord {
    /// Wall-clock time the sample was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Seconds since the session started.
    pub offset_secs: f64,
    /// Proximity ratio at the time of the sample.
    pub ratio: f64,
    /// Whether the user was too close at the time of the sample.
    pub too_close: bool,
}

/// A point on the proximity chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartPoint {
    /// Seconds relative to the earliest charted record.
    pub time_rel: f64,
    pub ratio: f64,
}

impl ChartPoint {
    /// Build chart points from history records.
    ///
    /// `time_rel` is measured from the smallest offset among `records`, so
    /// the chart always starts at zero even after older records were evicted.
    pub fn from_records(records: &[HistoryRecord]) -> Vec<ChartPoint> {
        let origin = records
            .iter()
            .map(|r| r.offset_secs)
            .fold(f64::INFINITY, f64::min);

        records
            .iter()
            .map(|r| ChartPoint {
                time_rel: r.offset_secs - origin,
                ratio: r.ratio,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(offset_secs: f64, ratio: f64) -> HistoryRecord {
        HistoryRecord {
            recorded_at: Utc::now(),
            offset_secs,
            ratio,
            too_close: ratio > 0.3,
        }
    }

    #[test]
    fn test_chart_points_start_at_zero() {
        let records = vec![record(12.0, 0.2), record(13.5, 0.4), record(15.0, 0.1)];
        let points = ChartPoint::from_records(&records);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].time_rel, 0.0);
        assert_eq!(points[1].time_rel, 1.5);
        assert_eq!(points[2].time_rel, 3.0);
        assert_eq!(points[1].ratio, 0.4);
    }

    #[test]
    fn test_chart_points_empty() {
        assert!(ChartPoint::from_records(&[]).is_empty());
    }

    #[test]
    fn test_history_record_roundtrip_fields() {
        let json = serde_json::to_value(record(1.0, 0.5)).unwrap();
        assert_eq!(json["too_close"], true);
        assert_eq!(json["offset_secs"], 1.0);
        assert!(json["recorded_at"].is_string());
    }
}

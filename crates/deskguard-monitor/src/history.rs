//! Bounded, throttled proximity history owned by a monitoring session.

use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use deskguard_models::{ChartPoint, HistoryRecord};
use tracing::info;

use crate::error::MonitorResult;

/// Rolling log of proximity samples.
///
/// At most one record is kept per `sample_interval`, and once `capacity`
/// records are held the oldest is evicted.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
    sample_interval: Duration,
    session_start: Instant,
    last_sample_at: Option<Instant>,
}

impl HistoryLog {
    pub fn new(capacity: usize, sample_interval: Duration, session_start: Instant) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            sample_interval,
            session_start,
            last_sample_at: None,
        }
    }

    /// Record a sample if the sampling interval has elapsed.
    ///
    /// Returns true if a record was appended.
    pub fn record(&mut self, sample_at: Instant, ratio: f64, too_close: bool) -> bool {
        self.record_at(sample_at, Utc::now(), ratio, too_close)
    }

    /// Like [`HistoryLog::record`] with an explicit wall-clock stamp.
    pub fn record_at(
        &mut self,
        sample_at: Instant,
        recorded_at: DateTime<Utc>,
        ratio: f64,
        too_close: bool,
    ) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if let Some(last) = self.last_sample_at {
            if sample_at.saturating_duration_since(last) < self.sample_interval {
                return false;
            }
        }

        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(HistoryRecord {
            recorded_at,
            offset_secs: sample_at.saturating_duration_since(self.session_start).as_secs_f64(),
            ratio,
            too_close,
        });
        self.last_sample_at = Some(sample_at);
        true
    }

    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Points for the proximity chart, relative to the oldest retained record.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        let records: Vec<HistoryRecord> = self.records.iter().cloned().collect();
        ChartPoint::from_records(&records)
    }

    /// Fraction of retained records where the user was too close.
    pub fn too_close_fraction(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let close = self.records.iter().filter(|r| r.too_close).count();
        close as f64 / self.records.len() as f64
    }

    /// Serialize the retained records as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.records)
    }

    /// Write the retained records to `path` as a JSON array.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> MonitorResult<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        tokio::fs::write(path, json).await?;
        info!(path = %path.display(), records = self.records.len(), "Saved session history");
        Ok(())
    }
}

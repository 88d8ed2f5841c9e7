//! Replay of recorded face detections.
//!
//! A trace is a JSON-lines file with one frame per line:
//!
//! ```text
//! {"t": 0.0, "frame_width": 640, "faces": [{"x": 200, "y": 120, "width": 210, "height": 260}]}
//! {"t": 0.1, "frame_width": 640, "faces": []}
//! {"t": 0.2, "ratio": 0.41}
//! ```
//!
//! `t` is seconds since the start of the recording and must never decrease.
//! A line either carries face boxes (with `frame_width`) or a precomputed
//! `ratio`. Blank lines are skipped.

use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use async_trait::async_trait;

use crate::error::{VisionError, VisionResult};
use crate::models::{BoundingBox, Detection};
use crate::proximity::{face_width_ratio, ProximitySample, ProximitySource};

#[derive(Debug, Deserialize)]
struct TraceFrame {
    t: f64,
    #[serde(default)]
    frame_width: Option<u32>,
    #[serde(default)]
    faces: Vec<TraceFace>,
    #[serde(default)]
    ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TraceFace {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default = "default_score")]
    score: f64,
}

fn default_score() -> f64 {
    1.0
}

impl TraceFace {
    fn to_detection(&self) -> Detection {
        Detection::new(BoundingBox::new(self.x, self.y, self.width, self.height), self.score)
    }
}

/// Proximity source that replays a recorded trace.
///
/// Samples are stamped `origin + t`, so the evaluator sees the recording's
/// own timing regardless of how fast the trace is consumed.
pub struct TraceProximitySource<R> {
    lines: Lines<R>,
    origin: Instant,
    line_no: usize,
    last_t: Option<f64>,
    realtime: bool,
}

impl TraceProximitySource<BufReader<File>> {
    /// Open a trace file.
    pub async fn open(path: impl AsRef<Path>) -> VisionResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).await?;
        info!(path = %path.display(), "Opened proximity trace");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R> TraceProximitySource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Replay a trace from any buffered reader, with `origin` set to now.
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            origin: Instant::now(),
            line_no: 0,
            last_t: None,
            realtime: false,
        }
    }

    /// Pace the replay so each frame is delivered at `origin + t`.
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Instant corresponding to trace time zero.
    pub fn origin(&self) -> Instant {
        self.origin
    }

    fn parse_line(&mut self, line: &str) -> VisionResult<ProximitySample> {
        let line_no = self.line_no;
        let frame: TraceFrame = serde_json::from_str(line)
            .map_err(|e| VisionError::invalid_trace(line_no, e.to_string()))?;

        if !frame.t.is_finite() || frame.t < 0.0 {
            return Err(VisionError::invalid_trace(
                line_no,
                format!("timestamp must be a non-negative number, got {}", frame.t),
            ));
        }
        if let Some(last_t) = self.last_t {
            if frame.t < last_t {
                return Err(VisionError::invalid_trace(
                    line_no,
                    format!("timestamp {} is earlier than previous {}", frame.t, last_t),
                ));
            }
        }

        let captured_at = Duration::try_from_secs_f64(frame.t)
            .ok()
            .and_then(|offset| self.origin.checked_add(offset))
            .ok_or_else(|| {
                VisionError::invalid_trace(line_no, format!("timestamp {} is out of range", frame.t))
            })?;
        self.last_t = Some(frame.t);

        if let Some(ratio) = frame.ratio {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(VisionError::invalid_trace(
                    line_no,
                    format!("ratio must be a non-negative number, got {}", ratio),
                ));
            }
            return Ok(ProximitySample {
                ratio,
                captured_at,
                face_count: frame.faces.len(),
            });
        }

        let detections: Vec<Detection> = frame.faces.iter().map(TraceFace::to_detection).collect();
        if detections.is_empty() {
            return Ok(ProximitySample::from_detections(&detections, 0, captured_at));
        }

        let frame_width = frame
            .frame_width
            .filter(|w| *w > 0)
            .ok_or_else(|| {
                VisionError::invalid_trace(line_no, "faces require a positive frame_width")
            })?;

        Ok(ProximitySample::from_detections(&detections, frame_width, captured_at))
    }
}

#[async_trait]
impl<R> ProximitySource for TraceProximitySource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_sample(&mut self) -> VisionResult<Option<ProximitySample>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                debug!(lines = self.line_no, "Proximity trace exhausted");
                return Ok(None);
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let sample = self.parse_line(trimmed)?;
            if self.realtime {
                tokio::time::sleep_until(tokio::time::Instant::from_std(sample.captured_at)).await;
            }
            return Ok(Some(sample));
        }
    }

    fn name(&self) -> &'static str {
        "trace"
    }
}

//! Face detection data models.

use serde::{Deserialize, Serialize};

/// Bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge x-coordinate.
    #[inline]
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    #[inline]
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    /// Box width relative to the frame width.
    ///
    /// Returns 0.0 for a zero-width frame or a degenerate box.
    pub fn relative_width(&self, frame_width: u32) -> f64 {
        if frame_width == 0 || !self.width.is_finite() || self.width <= 0.0 {
            return 0.0;
        }
        self.width / frame_width as f64
    }

    /// Clip the box to the frame, returning `None` if nothing is left.
    pub fn clip(&self, frame_width: u32, frame_height: u32) -> Option<BoundingBox> {
        let x1 = self.x.max(0.0);
        let y1 = self.y.max(0.0);
        let x2 = self.x2().min(frame_width as f64);
        let y2 = self.y2().min(frame_height as f64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(BoundingBox::new(x1, y1, x2 - x1, y2 - y1))
    }
}

/// A face detected in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box of the face
    pub bbox: BoundingBox,
    /// Detection confidence score (0.0-1.0)
    #[serde(default = "default_score")]
    pub score: f64,
}

fn default_score() -> f64 {
    1.0
}

impl Detection {
    /// Create a new detection.
    pub fn new(bbox: BoundingBox, score: f64) -> Self {
        Self { bbox, score }
    }
}

/// Detections for a single frame.
pub type FrameDetections = Vec<Detection>;

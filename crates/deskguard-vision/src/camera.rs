//! Webcam proximity source backed by OpenCV.
//!
//! Frames are captured with `VideoCapture` and faces are located with the
//! YuNet CNN detector exposed through OpenCV's `FaceDetectorYN`. Capture and
//! inference block, so each sample is taken on tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

use async_trait::async_trait;
use opencv::core::{self, Mat, Ptr, Size};
use opencv::objdetect::FaceDetectorYN;
use opencv::prelude::{FaceDetectorYNTrait, MatTraitConst, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{self, VideoCapture};
use tracing::{debug, info, warn};

use crate::error::{VisionError, VisionResult};
use crate::models::{BoundingBox, Detection, FrameDetections};
use crate::proximity::{ProximitySample, ProximitySource};

/// Minimum confidence for a face to be reported.
const SCORE_THRESHOLD: f32 = 0.5;
/// Non-maximum suppression IoU threshold.
const NMS_THRESHOLD: f32 = 0.3;
/// Maximum candidates kept before NMS.
const TOP_K: i32 = 50;

/// YuNet face detector.
pub struct YuNetDetector {
    detector: Ptr<FaceDetectorYN>,
    /// Network input size (width, height)
    input_size: (i32, i32),
    /// Frame size the input size was computed for
    frame_size: (i32, i32),
    model_path: PathBuf,
}

impl YuNetDetector {
    /// Load the YuNet ONNX model.
    pub fn new(model_path: impl AsRef<Path>) -> VisionResult<Self> {
        let model_path = model_path.as_ref().to_path_buf();
        if !model_path.is_file() {
            return Err(VisionError::ModelNotFound(model_path));
        }

        let input_size = (320, 320);
        let detector = FaceDetectorYN::create(
            &model_path.to_string_lossy(),
            "",
            Size::new(input_size.0, input_size.1),
            SCORE_THRESHOLD,
            NMS_THRESHOLD,
            TOP_K,
            opencv::dnn::DNN_BACKEND_DEFAULT,
            opencv::dnn::DNN_TARGET_CPU,
        )
        .map_err(|e| VisionError::detection_failed(format!("Failed to create YuNet detector: {}", e)))?;

        info!(model = %model_path.display(), "YuNet detector initialized");

        Ok(Self {
            detector,
            input_size,
            frame_size: (0, 0),
            model_path,
        })
    }

    /// Calculate the network input size for a frame.
    ///
    /// Webcam frames are scaled down to at most 640x480 and aligned to
    /// multiples of 32.
    fn calculate_input_size(frame_width: i32, frame_height: i32) -> (i32, i32) {
        let scale = (frame_width as f64 / 640.0)
            .max(frame_height as f64 / 480.0)
            .max(1.0);

        const ALIGNMENT: i32 = 32;
        let align = |v: f64| {
            let v = v.round() as i32;
            (((v + ALIGNMENT / 2) / ALIGNMENT) * ALIGNMENT).clamp(160, 640)
        };

        (
            align(frame_width as f64 / scale),
            align(frame_height as f64 / scale),
        )
    }

    /// Detect faces in a BGR frame. Boxes are returned in frame pixels.
    pub fn detect_in_frame(&mut self, frame: &Mat) -> VisionResult<FrameDetections> {
        use opencv::imgproc;

        if frame.empty() {
            return Ok(Vec::new());
        }

        let frame_width = frame.cols();
        let frame_height = frame.rows();

        if (frame_width, frame_height) != self.frame_size {
            self.input_size = Self::calculate_input_size(frame_width, frame_height);
            self.frame_size = (frame_width, frame_height);
            self.detector
                .set_input_size(Size::new(self.input_size.0, self.input_size.1))
                .map_err(|e| VisionError::detection_failed(format!("set_input_size: {}", e)))?;
            debug!(
                "YuNet input resized: frame={}x{}, input={}x{}",
                frame_width, frame_height, self.input_size.0, self.input_size.1
            );
        }

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size.0, self.input_size.1),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .map_err(|e| VisionError::detection_failed(format!("resize: {}", e)))?;

        let mut faces = Mat::default();
        self.detector
            .detect(&resized, &mut faces)
            .map_err(|e| VisionError::detection_failed(e.to_string()))?;

        Ok(self.parse_detections(&faces, frame_width as f64, frame_height as f64))
    }

    /// Parse the YuNet output matrix.
    ///
    /// Each row is `[x, y, w, h, <10 landmark coords>, score]`.
    fn parse_detections(&self, faces: &Mat, frame_width: f64, frame_height: f64) -> FrameDetections {
        let rows = faces.rows();
        if rows <= 0 {
            return Vec::new();
        }
        if faces.cols() < 15 {
            warn!("YuNet output has unexpected format: {} columns", faces.cols());
            return Vec::new();
        }

        let scale_x = frame_width / self.input_size.0 as f64;
        let scale_y = frame_height / self.input_size.1 as f64;
        let value = |row: i32, col: i32| faces.at_2d::<f32>(row, col).ok().map(|v| *v as f64);

        let mut detections = Vec::with_capacity(rows as usize);
        for row in 0..rows {
            let (Some(x), Some(y), Some(w), Some(h), Some(score)) = (
                value(row, 0),
                value(row, 1),
                value(row, 2),
                value(row, 3),
                value(row, 14),
            ) else {
                continue;
            };

            let bbox = BoundingBox::new(x * scale_x, y * scale_y, w * scale_x, h * scale_y);
            if let Some(bbox) = bbox.clip(frame_width as u32, frame_height as u32) {
                detections.push(Detection::new(bbox, score));
            }
        }

        detections
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

struct CameraState {
    capture: VideoCapture,
    detector: YuNetDetector,
}

impl CameraState {
    fn sample(&mut self) -> VisionResult<ProximitySample> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|e| VisionError::frame_read_failed(e.to_string()))?;
        let captured_at = Instant::now();

        if !grabbed || frame.empty() {
            return Err(VisionError::frame_read_failed("camera returned an empty frame"));
        }

        // Selfie view, so boxes match what the user sees.
        let mut mirrored = Mat::default();
        core::flip(&frame, &mut mirrored, 1)
            .map_err(|e| VisionError::frame_read_failed(e.to_string()))?;

        let detections = self.detector.detect_in_frame(&mirrored)?;
        Ok(ProximitySample::from_detections(
            &detections,
            mirrored.cols().max(0) as u32,
            captured_at,
        ))
    }
}

/// Proximity source reading a local webcam.
pub struct CameraProximitySource {
    index: i32,
    state: Arc<Mutex<CameraState>>,
}

impl CameraProximitySource {
    /// Open camera `index` and load the YuNet model.
    pub fn open(index: i32, model_path: impl AsRef<Path>) -> VisionResult<Self> {
        let detector = YuNetDetector::new(model_path)?;

        let capture = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|_| VisionError::CameraUnavailable { index })?;
        let opened = capture
            .is_opened()
            .map_err(|_| VisionError::CameraUnavailable { index })?;
        if !opened {
            return Err(VisionError::CameraUnavailable { index });
        }

        info!(camera = index, "Camera opened");

        Ok(Self {
            index,
            state: Arc::new(Mutex::new(CameraState { capture, detector })),
        })
    }

    pub fn index(&self) -> i32 {
        self.index
    }
}

#[async_trait]
impl ProximitySource for CameraProximitySource {
    async fn next_sample(&mut self) -> VisionResult<Option<ProximitySample>> {
        let state = Arc::clone(&self.state);
        let sample = tokio::task::spawn_blocking(move || {
            let mut state = state
                .lock()
                .map_err(|_| VisionError::internal("camera state lock poisoned"))?;
            state.sample()
        })
        .await
        .map_err(|e| VisionError::internal(format!("capture task failed: {}", e)))??;

        Ok(Some(sample))
    }

    fn name(&self) -> &'static str {
        "camera"
    }
}

/// Run `release` on the state unless a capture task currently holds it.
///
/// Returns false when the lock is busy. The in-flight task owns a clone of the
/// `Arc`, so the capture is closed when that task drops it.
fn release_if_idle<T>(state: &Mutex<T>, release: impl FnOnce(&mut T)) -> bool {
    match state.try_lock() {
        Ok(mut guard) => {
            release(&mut *guard);
            true
        }
        Err(TryLockError::Poisoned(poisoned)) => {
            let mut guard = poisoned.into_inner();
            release(&mut *guard);
            true
        }
        Err(TryLockError::WouldBlock) => false,
    }
}

impl Drop for CameraProximitySource {
    fn drop(&mut self) {
        let index = self.index;
        let released = release_if_idle(&self.state, |state| {
            if let Err(e) = state.capture.release() {
                warn!(camera = index, "Failed to release camera: {}", e);
            }
        });
        if !released {
            debug!(camera = index, "Capture in flight, camera closes when it finishes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_size_alignment() {
        assert_eq!(YuNetDetector::calculate_input_size(640, 480), (640, 480));
        assert_eq!(YuNetDetector::calculate_input_size(1280, 720), (640, 352));
        assert_eq!(YuNetDetector::calculate_input_size(320, 240), (320, 256));
    }

    #[test]
    fn test_missing_model() {
        let result = YuNetDetector::new("/nonexistent/yunet.onnx");
        assert!(matches!(result, Err(VisionError::ModelNotFound(_))));
    }

    #[test]
    fn test_release_runs_when_idle() {
        let state = Mutex::new(0u32);
        assert!(release_if_idle(&state, |n| *n += 1));
        assert_eq!(*state.lock().unwrap(), 1);
    }

    #[test]
    fn test_release_skipped_while_capture_holds_lock() {
        let state = Mutex::new(0u32);
        let guard = state.lock().unwrap();

        let start = Instant::now();
        assert!(!release_if_idle(&state, |n| *n += 1));
        assert!(start.elapsed() < std::time::Duration::from_secs(1));

        drop(guard);
        assert_eq!(*state.lock().unwrap(), 0);
    }
}

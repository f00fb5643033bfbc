//! Turning camera frames into a single tracking target.
//!
//! Every [`Detector`] normalizes the output of its model into a [`DetectionResult`]: whether a
//! target was found, where its center is (in pixels), and one scalar *metric* that the paired
//! tracker uses to judge distance. What the metric means depends on the detector:
//!
//! | Detector          | Metric                                             | Paired tracker |
//! |-------------------|----------------------------------------------------|----------------|
//! | [`FaceDetector`]  | relative bounding box area (`0.0..=1.0`)           | [`FaceTracker`] |
//! | [`HumanDetector`] | bounding box height in pixels                      | [`HumanTracker`], [`HumanCircler`] |
//!
//! The two metrics are not interchangeable; [`crate::control::TrackerKind`] always constructs
//! matching pairs.
//!
//! [`FaceTracker`]: crate::tracking::FaceTracker
//! [`HumanTracker`]: crate::tracking::HumanTracker
//! [`HumanCircler`]: crate::tracking::HumanCircler

pub mod face;
pub mod human;
pub mod labels;
pub mod nms;

use crate::frame::{Frame, Rect};
use crate::timer::Timer;

pub use face::{FaceCandidate, FaceDetector, FaceInference};
pub use human::{HumanDetector, ObjectInference, RawDetections};
pub use labels::ClassLabels;

/// A detector producing at most one tracking target per frame.
///
/// Detectors are not thread-safe by contract; they are driven from the control loop only.
pub trait Detector {
    /// Runs detection on `frame`.
    ///
    /// `frame` is only borrowed for the duration of the call. The returned result carries its own
    /// annotated copy of the frame.
    ///
    /// Errors are returned when the inference capability fails; they are not retried.
    fn predict(&mut self, frame: &Frame) -> anyhow::Result<DetectionResult>;

    /// Returns the timers measuring the detector's stages, for performance logging.
    fn timers(&self) -> &[Timer];
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn predict(&mut self, frame: &Frame) -> anyhow::Result<DetectionResult> {
        (**self).predict(frame)
    }

    fn timers(&self) -> &[Timer] {
        (**self).timers()
    }
}

/// The normalized output of a [`Detector`] for one frame.
///
/// If no target was detected, [`DetectionResult::center`] is `(0, 0)`,
/// [`DetectionResult::metric`] is `0.0` and there is no bounding box.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    detected: bool,
    annotated: Frame,
    center: (i32, i32),
    metric: f32,
    bbox: Option<Rect>,
    confidence: f32,
}

impl DetectionResult {
    /// Creates a result for a frame in which no target was found.
    pub fn missed(annotated: Frame) -> Self {
        Self {
            detected: false,
            annotated,
            center: (0, 0),
            metric: 0.0,
            bbox: None,
            confidence: 0.0,
        }
    }

    /// Creates a result for a detected target.
    ///
    /// `bbox` is in pixel coordinates of the original frame.
    pub fn found(
        annotated: Frame,
        center: (i32, i32),
        metric: f32,
        bbox: Rect,
        confidence: f32,
    ) -> Self {
        Self {
            detected: true,
            annotated,
            center,
            metric,
            bbox: Some(bbox),
            confidence,
        }
    }

    #[inline]
    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Returns the center of the target, in pixels.
    #[inline]
    pub fn center(&self) -> (i32, i32) {
        self.center
    }

    /// Returns the detector-specific distance metric (see the [module docs](self)).
    #[inline]
    pub fn metric(&self) -> f32 {
        self.metric
    }

    /// Returns the target's bounding box in pixel coordinates.
    #[inline]
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.bbox
    }

    /// Returns the confidence of the selected target, or 0.0 if nothing was detected.
    #[inline]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the frame with the detections drawn onto it.
    #[inline]
    pub fn annotated_frame(&self) -> &Frame {
        &self.annotated
    }

    pub fn into_annotated_frame(self) -> Frame {
        self.annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missed_result_is_zeroed() {
        let res = DetectionResult::missed(Frame::new(4, 4));
        assert!(!res.detected());
        assert_eq!(res.center(), (0, 0));
        assert_eq!(res.metric(), 0.0);
        assert!(res.bounding_rect().is_none());
    }
}

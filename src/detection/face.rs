//! Face detection.
//!
//! The network itself is supplied through the [`FaceInference`] capability. [`FaceDetector`]
//! handles preprocessing, confidence filtering, target selection and annotation.

use crate::frame::{draw_marker, draw_rect, draw_text, Color, Frame, Rect};
use crate::resolution::Resolution;
use crate::timer::Timer;

use super::{DetectionResult, Detector};

/// A face found by a [`FaceInference`] capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCandidate {
    /// Bounding box relative to the input image (all coordinates in `0.0..=1.0`).
    pub rect: Rect,
    /// Detection confidence in `0.0..=1.0`.
    pub score: f32,
}

impl FaceCandidate {
    /// Creates a candidate from a relative top-left corner and size.
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, score: f32) -> Self {
        Self {
            rect: Rect::from_top_left(xmin, ymin, width, height),
            score,
        }
    }
}

/// Capability running a face detection network on a single image.
///
/// Since the returned boxes are relative, the result does not depend on the input resolution.
pub trait FaceInference {
    fn infer(&mut self, image: &Frame) -> anyhow::Result<Vec<FaceCandidate>>;
}

impl<F> FaceInference for F
where
    F: FnMut(&Frame) -> anyhow::Result<Vec<FaceCandidate>>,
{
    fn infer(&mut self, image: &Frame) -> anyhow::Result<Vec<FaceCandidate>> {
        self(image)
    }
}

/// Detects faces and selects the largest (and thus presumably closest) one as the target.
///
/// The reported metric is the relative area of the selected face's bounding box.
pub struct FaceDetector {
    inference: Box<dyn FaceInference + Send>,
    input_resolution: Resolution,
    thresh: f32,
    timers: [Timer; 2],
}

impl FaceDetector {
    pub const DEFAULT_THRESHOLD: f32 = 0.5;

    pub fn new<I: FaceInference + Send + 'static>(inference: I) -> Self {
        Self::from_boxed(Box::new(inference))
    }

    pub fn from_boxed(inference: Box<dyn FaceInference + Send>) -> Self {
        Self {
            inference,
            input_resolution: Resolution::RES_VGA,
            thresh: Self::DEFAULT_THRESHOLD,
            timers: [Timer::new("infer"), Timer::new("annotate")],
        }
    }

    /// Sets the minimum confidence a face needs to be considered.
    #[inline]
    pub fn set_threshold(&mut self, thresh: f32) {
        self.thresh = thresh;
    }

    /// Sets the resolution frames are scaled to before inference.
    #[inline]
    pub fn set_input_resolution(&mut self, res: Resolution) {
        self.input_resolution = res;
    }

    pub fn input_resolution(&self) -> Resolution {
        self.input_resolution
    }
}

impl Detector for FaceDetector {
    fn predict(&mut self, frame: &Frame) -> anyhow::Result<DetectionResult> {
        let [t_infer, t_annotate] = &self.timers;

        let input = frame.resized(self.input_resolution);
        let candidates = t_infer.time(|| self.inference.infer(&input))?;
        log::trace!("face inference result: {:?}", candidates);

        let _guard = t_annotate.start();
        let mut annotated = frame.clone();
        let (w, h) = (frame.width() as f32, frame.height() as f32);

        let mut target: Option<FaceCandidate> = None;
        for face in candidates.into_iter().filter(|c| c.score >= self.thresh) {
            draw_face(&mut annotated, &face);
            if target.map_or(true, |t| face.rect.area() > t.rect.area()) {
                target = Some(face);
            }
        }

        let Some(target) = target else {
            return Ok(DetectionResult::missed(annotated));
        };

        let (xc, yc) = target.rect.center();
        let center = ((xc * w) as i32, (yc * h) as i32);
        Ok(DetectionResult::found(
            annotated,
            center,
            target.rect.area(),
            target.rect.scale_by(w, h),
            target.score,
        ))
    }

    fn timers(&self) -> &[Timer] {
        &self.timers
    }
}

fn draw_face(frame: &mut Frame, face: &FaceCandidate) {
    let (w, h) = (frame.width() as f32, frame.height() as f32);
    let rect = face.rect.scale_by(w, h);
    let (xc, yc) = rect.center();

    draw_rect(frame, rect).color(Color::WHITE);
    draw_marker(frame, xc as i32, yc as i32);

    let label = format!("{:.2}%", face.score * 100.0);
    draw_text(frame, rect.x() as i32, rect.y() as i32 - 10, &label)
        .align_left()
        .align_bottom();
}

//! Person detection on top of a generic object detection network.

use crate::error::Error;
use crate::frame::{draw_rect, draw_text, Color, Frame, Rect};
use crate::resolution::Resolution;
use crate::timer::Timer;

use super::{labels::ClassLabels, nms::NonMaxSuppression, DetectionResult, Detector};

/// Raw, unsuppressed output of an object detection network.
///
/// The three vectors are parallel: entry `i` of each describes detection `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDetections {
    /// Bounding boxes as `[ymin, xmin, ymax, xmax]`, relative to the input image.
    pub boxes: Vec<[f32; 4]>,
    /// Class ID of each detection.
    pub classes: Vec<u32>,
    /// Confidence of each detection.
    pub scores: Vec<f32>,
}

impl RawDetections {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.classes.len() != self.boxes.len() || self.scores.len() != self.boxes.len() {
            anyhow::bail!(
                "malformed detector output: {} boxes, {} classes, {} scores",
                self.boxes.len(),
                self.classes.len(),
                self.scores.len(),
            );
        }
        Ok(())
    }

    fn rect(&self, index: usize) -> Rect {
        let [ymin, xmin, ymax, xmax] = self.boxes[index];
        Rect::from_corners((xmin, ymin), (xmax, ymax))
    }
}

/// Capability running an object detection network on a single image.
pub trait ObjectInference {
    fn infer(&mut self, image: &Frame) -> anyhow::Result<RawDetections>;
}

impl<F> ObjectInference for F
where
    F: FnMut(&Frame) -> anyhow::Result<RawDetections>,
{
    fn infer(&mut self, image: &Frame) -> anyhow::Result<RawDetections> {
        self(image)
    }
}

/// Detects people and selects the most confident one as the target.
///
/// Raw detections of *all* classes go through non-maximum suppression first; only the survivors
/// are filtered down to the person class. A confident detection of another class can thus
/// suppress an overlapping person.
///
/// The reported metric is the height of the selected bounding box in pixels.
pub struct HumanDetector {
    inference: Box<dyn ObjectInference + Send>,
    input_resolution: Resolution,
    person_class: u32,
    nms: NonMaxSuppression,
    timers: [Timer; 3],
}

impl HumanDetector {
    pub const DEFAULT_THRESHOLD: f32 = 0.5;

    /// Creates a person detector.
    ///
    /// `input_resolution` is the size the network expects; frames are scaled to it before
    /// inference. Fails with [`Error::MissingClass`] if `labels` has no `person` class.
    pub fn new<I: ObjectInference + Send + 'static>(
        inference: I,
        labels: &ClassLabels,
        input_resolution: Resolution,
    ) -> Result<Self, Error> {
        Self::from_boxed(Box::new(inference), labels, input_resolution)
    }

    pub fn from_boxed(
        inference: Box<dyn ObjectInference + Send>,
        labels: &ClassLabels,
        input_resolution: Resolution,
    ) -> Result<Self, Error> {
        let person_class = labels.id_of("person").ok_or(Error::MissingClass("person"))?;
        log::debug!("person class ID: {person_class}, input resolution: {input_resolution}");

        Ok(Self {
            inference,
            input_resolution,
            person_class,
            nms: NonMaxSuppression::new(Self::DEFAULT_THRESHOLD),
            timers: [
                Timer::new("infer"),
                Timer::new("nms"),
                Timer::new("annotate"),
            ],
        })
    }

    /// Sets the threshold used both as the minimum score and as the NMS overlap threshold.
    pub fn set_threshold(&mut self, thresh: f32) {
        self.nms.set_iou_thresh(thresh);
        self.nms.set_score_thresh(thresh);
    }

    pub fn nms_mut(&mut self) -> &mut NonMaxSuppression {
        &mut self.nms
    }

    pub fn input_resolution(&self) -> Resolution {
        self.input_resolution
    }

    pub fn person_class(&self) -> u32 {
        self.person_class
    }
}

impl Detector for HumanDetector {
    fn predict(&mut self, frame: &Frame) -> anyhow::Result<DetectionResult> {
        let [t_infer, t_nms, t_annotate] = &self.timers;

        let input = frame.resized(self.input_resolution);
        let raw = t_infer.time(|| self.inference.infer(&input))?;
        raw.validate()?;

        let target = t_nms.time(|| {
            let rects = (0..raw.len()).map(|i| raw.rect(i)).collect::<Vec<_>>();
            let selected = self.nms.select(&rects, &raw.scores);
            log::trace!("{} of {} detections survived NMS", selected.len(), raw.len());

            // `select` orders by descending score, so the first person is the most confident one.
            selected
                .into_iter()
                .find(|&i| raw.classes[i] == self.person_class)
        });

        let _guard = t_annotate.start();
        let mut annotated = frame.clone();
        let Some(index) = target else {
            return Ok(DetectionResult::missed(annotated));
        };

        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let [ymin, xmin, ymax, xmax] = raw.boxes[index];
        let (ymin, xmin, ymax, xmax) = (
            (ymin * h) as i32,
            (xmin * w) as i32,
            (ymax * h) as i32,
            (xmax * w) as i32,
        );
        let confidence = raw.scores[index];

        let bbox = Rect::from_corners((xmin as f32, ymin as f32), (xmax as f32, ymax as f32));
        draw_rect(&mut annotated, bbox);
        let label = format!("PERSON {:.2}%", confidence * 100.0);
        draw_text(&mut annotated, xmin, ymin - 10, &label)
            .color(Color::GREEN)
            .align_left()
            .align_bottom();

        let center = ((xmin + xmax) / 2, (ymin + ymax) / 2);
        let height = (ymax - ymin) as f32;
        Ok(DetectionResult::found(annotated, center, height, bbox, confidence))
    }

    fn timers(&self) -> &[Timer] {
        &self.timers
    }
}

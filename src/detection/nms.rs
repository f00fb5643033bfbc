//! Non-Maximum Suppression.
//!
//! Object detectors produce duplicate detections for individual objects. Non-Maximum Suppression
//! (NMS) filters these duplicates out, leaving only the detection with the highest confidence for
//! each object.
//!
//! The suppression here is class-agnostic: a high-scoring box of one class removes overlapping
//! boxes of every other class as well. Class filtering happens *after* suppression.

use crate::frame::Rect;

/// A greedy non-maximum suppression algorithm.
#[derive(Debug, Clone, Copy)]
pub struct NonMaxSuppression {
    iou_thresh: f32,
    score_thresh: f32,
    max_output: usize,
}

impl NonMaxSuppression {
    /// The default maximum number of detections that survive suppression.
    pub const DEFAULT_MAX_OUTPUT: usize = 30;

    /// Creates a suppressor using `thresh` both as the IOU and as the score threshold.
    pub fn new(thresh: f32) -> Self {
        Self {
            iou_thresh: thresh,
            score_thresh: thresh,
            max_output: Self::DEFAULT_MAX_OUTPUT,
        }
    }

    /// Sets the intersection-over-union threshold above which two detections overlap.
    pub fn set_iou_thresh(&mut self, iou_thresh: f32) {
        self.iou_thresh = iou_thresh;
    }

    /// Sets the score a detection has to exceed to be considered at all.
    pub fn set_score_thresh(&mut self, score_thresh: f32) {
        self.score_thresh = score_thresh;
    }

    /// Sets the maximum number of detections to return.
    pub fn set_max_output(&mut self, max_output: usize) {
        self.max_output = max_output;
    }

    /// Performs non-maximum suppression.
    ///
    /// Returns the indices of the surviving detections in order of descending score.
    ///
    /// # Panics
    ///
    /// Panics if `rects` and `scores` have different lengths.
    pub fn select(&self, rects: &[Rect], scores: &[f32]) -> Vec<usize> {
        assert_eq!(
            rects.len(),
            scores.len(),
            "every box needs exactly one score"
        );

        let mut candidates = (0..rects.len())
            .filter(|&i| scores[i] > self.score_thresh)
            .collect::<Vec<_>>();

        // Sort by ascending score, process highest score first by starting at the back.
        candidates.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

        let mut selected = Vec::new();
        while let Some(seed) = candidates.pop() {
            if selected.len() >= self.max_output {
                break;
            }

            candidates.retain(|&other| rects[seed].iou(&rects[other]) <= self.iou_thresh);
            selected.push(seed);
        }

        selected
    }
}

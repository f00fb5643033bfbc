//! Turning detections into velocity commands.
//!
//! A [`Tracker`] is a pure function of the current [`Observation`], the [`ErrorState`] it
//! returned for the previous frame, and the *track-enabled gate*. It returns the new error state
//! (which the caller has to pass back in on the next frame) and a [`VelocityCommand`] for the
//! drone.
//!
//! Every controlled axis runs an independent PD loop (see [`PdAxis`]). Integral gains are part of
//! the configuration, but never evaluated.
//!
//! | Tracker          | Yaw      | Up/Down                 | Forward/Backward           | Left/Right |
//! |------------------|----------|-------------------------|----------------------------|------------|
//! | [`FaceTracker`]  | PD on x  | PD on y (inverted)      | bang-bang on the face area | -          |
//! | [`HumanTracker`] | PD on x  | PD on estimated height  | PD on estimated distance   | -          |
//! | [`HumanCircler`] | PD on x  | PD on y (inverted)      | -                          | constant   |
//!
//! # The track-enabled gate
//!
//! While the gate is closed (`enabled == false`), every tracker returns
//! [`VelocityCommand::ZERO`] and [`ErrorState::ZERO`], no matter what is visible. The operator
//! has to confirm the target before the drone moves.

mod circle;
mod face;
mod human;
mod pid;

use std::fmt;

use crate::detection::DetectionResult;
use crate::frame::Rect;

pub use circle::{CircleConfig, HumanCircler};
pub use face::{FaceTracker, FaceTrackerConfig};
pub use human::{HumanTracker, HumanTrackerConfig};
pub use pid::{PdAxis, PidGains};

/// What a tracker gets to see of a detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub detected: bool,
    /// Center of the target in pixels, `(0, 0)` when nothing was detected.
    pub center: (i32, i32),
    /// Detector-specific distance metric, `0.0` when nothing was detected.
    pub metric: f32,
    /// Bounding box of the target in pixels.
    pub bbox: Option<Rect>,
}

impl Observation {
    /// An observation of an empty scene.
    pub const MISSED: Self = Self {
        detected: false,
        center: (0, 0),
        metric: 0.0,
        bbox: None,
    };

    pub fn found(center: (i32, i32), metric: f32, bbox: Option<Rect>) -> Self {
        Self {
            detected: true,
            center,
            metric,
            bbox,
        }
    }
}

impl From<&DetectionResult> for Observation {
    fn from(res: &DetectionResult) -> Self {
        if !res.detected() {
            return Self::MISSED;
        }

        Self::found(res.center(), res.metric(), res.bounding_rect())
    }
}

/// Per-axis control error of the previous frame, needed for the derivative term.
///
/// Trackers that control fewer than 3 axes leave the unused ones at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorState {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ErrorState {
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };
}

/// Velocity command for the drone, each component in `-100..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VelocityCommand {
    pub left_right: i32,
    pub forward_backward: i32,
    pub up_down: i32,
    pub yaw: i32,
}

impl VelocityCommand {
    pub const ZERO: Self = Self {
        left_right: 0,
        forward_backward: 0,
        up_down: 0,
        yaw: 0,
    };

    pub const fn new(left_right: i32, forward_backward: i32, up_down: i32, yaw: i32) -> Self {
        Self {
            left_right,
            forward_backward,
            up_down,
            yaw,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for VelocityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lr={} fb={} ud={} yaw={}",
            self.left_right, self.forward_backward, self.up_down, self.yaw
        )
    }
}

/// Result of a single [`Tracker::track`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutput {
    pub error: ErrorState,
    pub command: VelocityCommand,
}

impl TrackOutput {
    /// Output of a tracker that must not move the drone.
    pub const IDLE: Self = Self {
        error: ErrorState::ZERO,
        command: VelocityCommand::ZERO,
    };
}

/// What a tracker does when the gate is open but nothing is detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LostTargetYaw {
    /// Keep running the yaw loop against a center of `(0, 0)`.
    ///
    /// The drone keeps turning towards the left edge of the image until a target reappears. All
    /// other axes are silent.
    #[default]
    Continue,
    /// Stop all motion until a target reappears.
    Hold,
}

/// A stateless controller mapping observations to velocity commands.
pub trait Tracker {
    /// Computes the error state and velocity command for the current frame.
    ///
    /// `previous` must be the error state returned for the previous frame (or
    /// [`ErrorState::ZERO`] for the first one).
    fn track(&self, observation: &Observation, previous: ErrorState, enabled: bool)
        -> TrackOutput;
}

impl<T: Tracker + ?Sized> Tracker for Box<T> {
    fn track(
        &self,
        observation: &Observation,
        previous: ErrorState,
        enabled: bool,
    ) -> TrackOutput {
        (**self).track(observation, previous, enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn observation_of_missed_detection() {
        let res = DetectionResult::missed(Frame::new(2, 2));
        assert_eq!(Observation::from(&res), Observation::MISSED);
    }

    #[test]
    fn observation_of_found_detection() {
        let bbox = Rect::from_corners((10.0, 20.0), (30.0, 60.0));
        let res = DetectionResult::found(Frame::new(2, 2), (20, 40), 40.0, bbox, 0.9);
        let obs = Observation::from(&res);
        assert!(obs.detected);
        assert_eq!(obs.center, (20, 40));
        assert_eq!(obs.metric, 40.0);
        assert_eq!(obs.bbox, Some(bbox));
    }

    #[test]
    fn zero_command() {
        assert!(VelocityCommand::ZERO.is_zero());
        assert!(!VelocityCommand::new(0, 0, 0, 1).is_zero());
        assert_eq!(
            VelocityCommand::new(-15, 0, 3, 50).to_string(),
            "lr=-15 fb=0 ud=3 yaw=50"
        );
    }
}

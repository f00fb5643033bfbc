use crate::resolution::Resolution;

use super::{
    ErrorState, LostTargetYaw, Observation, PdAxis, PidGains, TrackOutput, Tracker,
    VelocityCommand,
};

/// Configuration of a [`FaceTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceTrackerConfig {
    /// Resolution of the frames the face center is reported in.
    pub resolution: Resolution,
    /// Relative face area `[min, max]` at which the drone holds its distance.
    pub area_range: [f32; 2],
    /// Gains of the yaw and the vertical loop.
    pub gains: PidGains,
    /// Saturation of the yaw and the vertical loop.
    pub limit: i32,
    /// Forward/backward speed used to approach or back off.
    pub approach_speed: i32,
    pub lost_target_yaw: LostTargetYaw,
}

impl Default for FaceTrackerConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::RES_720P,
            area_range: [0.01, 0.02],
            gains: PidGains::new(0.15, 0.0, 0.15),
            limit: 50,
            approach_speed: 25,
            lost_target_yaw: LostTargetYaw::default(),
        }
    }
}

/// Keeps a face centered, and keeps it at a distance at which its relative area lies in
/// [`FaceTrackerConfig::area_range`].
///
/// Pairs with [`FaceDetector`](crate::detection::FaceDetector). The error state uses the `x` and
/// `y` axes.
#[derive(Debug, Clone)]
pub struct FaceTracker {
    config: FaceTrackerConfig,
    axis: PdAxis,
}

impl FaceTracker {
    pub fn new(config: FaceTrackerConfig) -> Self {
        Self {
            axis: PdAxis::new(config.gains, config.limit),
            config,
        }
    }

    pub fn config(&self) -> &FaceTrackerConfig {
        &self.config
    }

    fn forward_backward(&self, area: f32) -> i32 {
        let [min, max] = self.config.area_range;
        if area > max {
            -self.config.approach_speed
        } else if area < min && area != 0.0 {
            self.config.approach_speed
        } else {
            0
        }
    }
}

impl Default for FaceTracker {
    fn default() -> Self {
        Self::new(FaceTrackerConfig::default())
    }
}

impl Tracker for FaceTracker {
    fn track(&self, obs: &Observation, previous: ErrorState, enabled: bool) -> TrackOutput {
        if !enabled {
            return TrackOutput::IDLE;
        }

        let (mid_x, mid_y) = self.config.resolution.center();
        let (x, y) = obs.center;
        let error_x = x - mid_x;
        let yaw = self.axis.output(error_x as f32, previous.x as f32);

        if !obs.detected {
            return match self.config.lost_target_yaw {
                LostTargetYaw::Hold => TrackOutput::IDLE,
                LostTargetYaw::Continue => TrackOutput {
                    error: ErrorState {
                        x: error_x,
                        ..ErrorState::ZERO
                    },
                    command: VelocityCommand::new(0, 0, 0, yaw),
                },
            };
        }

        let error_y = y - mid_y;
        // Pixel y grows downwards, so a face below the center means "descend".
        let up_down = -self.axis.output(error_y as f32, previous.y as f32);
        let forward_backward = self.forward_backward(obs.metric);

        TrackOutput {
            error: ErrorState {
                x: error_x,
                y: error_y,
                z: 0,
            },
            command: VelocityCommand::new(0, forward_backward, up_down, yaw),
        }
    }
}

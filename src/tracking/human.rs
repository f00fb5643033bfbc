use crate::geometry::{CameraGeometry, Pinhole};
use crate::resolution::Resolution;

use super::{
    ErrorState, LostTargetYaw, Observation, PdAxis, PidGains, TrackOutput, Tracker,
    VelocityCommand,
};

/// Configuration of a [`HumanTracker`].
///
/// All lengths are in centimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanTrackerConfig {
    pub resolution: Resolution,
    /// Distance to keep between the drone and the person.
    pub target_distance: f32,
    /// Height above ground to hold.
    pub target_height: f32,
    /// Real height of the tracked person.
    pub person_height: f32,
    pub yaw: PidGains,
    pub forward: PidGains,
    pub vertical: PidGains,
    pub limit: i32,
    pub camera: CameraGeometry,
    pub lost_target_yaw: LostTargetYaw,
}

impl HumanTrackerConfig {
    /// Creates a configuration with the default gains and camera.
    pub fn new(target_distance: f32, target_height: f32, person_height: f32) -> Self {
        Self {
            resolution: Resolution::RES_720P,
            target_distance,
            target_height,
            person_height,
            yaw: PidGains::new(0.15, 0.1, 0.2),
            forward: PidGains::new(0.3, 0.3, 0.3),
            vertical: PidGains::new(0.1, 0.01, 0.1),
            limit: 50,
            camera: CameraGeometry::default(),
            lost_target_yaw: LostTargetYaw::default(),
        }
    }
}

/// Follows a standing person at a fixed distance and height.
///
/// Distance and height of the drone are estimated from the person's bounding box height (the
/// metric reported by [`HumanDetector`](crate::detection::HumanDetector)) and the real height of
/// the person, see [`CameraGeometry`]. The error state uses all three axes: `x` is the horizontal
/// pixel offset, `y` the height error and `z` the distance error, both in centimeters.
#[derive(Debug, Clone)]
pub struct HumanTracker {
    config: HumanTrackerConfig,
    pinhole: Pinhole,
    yaw: PdAxis,
    forward: PdAxis,
    vertical: PdAxis,
}

impl HumanTracker {
    pub fn new(config: HumanTrackerConfig) -> Self {
        Self {
            yaw: PdAxis::new(config.yaw, config.limit),
            forward: PdAxis::new(config.forward, config.limit),
            vertical: PdAxis::new(config.vertical, config.limit),
            pinhole: config.camera.pinhole(),
            config,
        }
    }

    pub fn config(&self) -> &HumanTrackerConfig {
        &self.config
    }

    /// Returns the camera model derived from the configuration.
    pub fn pinhole(&self) -> &Pinhole {
        &self.pinhole
    }

    /// Returns the estimated `(distance, drone_height)` for an observation, if one can be made.
    fn estimate(&self, obs: &Observation) -> Option<(f32, f32)> {
        if !obs.detected {
            return None;
        }

        let distance = self.pinhole.distance(self.config.person_height, obs.metric)?;
        let height = self
            .pinhole
            .drone_height(self.config.person_height, obs.center.1 as f32, distance);
        Some((distance, height))
    }
}

impl Tracker for HumanTracker {
    fn track(&self, obs: &Observation, previous: ErrorState, enabled: bool) -> TrackOutput {
        if !enabled {
            return TrackOutput::IDLE;
        }

        let (mid_x, _) = self.config.resolution.center();
        let error_x = obs.center.0 - mid_x;
        let yaw = self.yaw.output(error_x as f32, previous.x as f32);

        let Some((distance, height)) = self.estimate(obs) else {
            // A zero-height box is treated exactly like a missing detection.
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
        };
        log::trace!("estimated distance: {distance:.1}cm, drone height: {height:.1}cm");

        let error_y = -(height - self.config.target_height);
        let error_z = distance - self.config.target_distance;
        let up_down = self.vertical.output(error_y, previous.y as f32);
        let forward_backward = self.forward.output(error_z, previous.z as f32);

        TrackOutput {
            error: ErrorState {
                x: error_x,
                y: error_y as i32,
                z: error_z as i32,
            },
            command: VelocityCommand::new(0, forward_backward, up_down, yaw),
        }
    }
}

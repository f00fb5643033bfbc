use crate::resolution::Resolution;

use super::{ErrorState, Observation, PdAxis, PidGains, TrackOutput, Tracker, VelocityCommand};

/// Configuration of a [`HumanCircler`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleConfig {
    pub resolution: Resolution,
    /// Horizontal focal length of the camera, in pixels.
    pub horizontal_focal_length: f32,
    /// Vertical focal length of the camera, in pixels.
    pub vertical_focal_length: f32,
    /// Orbit radius, in meters.
    pub target_distance: f32,
    /// Base gains of the yaw and the vertical loop, before distance scaling.
    pub gains: PidGains,
    /// Lateral speed of the orbit.
    pub circle_speed: i32,
    pub limit: i32,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::RES_720P,
            horizontal_focal_length: 443.61,
            vertical_focal_length: 591.48,
            target_distance: 1.5,
            gains: PidGains::new(0.15, 0.1, 0.15),
            circle_speed: 15,
            limit: 50,
        }
    }
}

/// Orbits around a person while keeping them centered.
///
/// The drone flies sideways at a constant speed; the yaw and vertical loops keep the bounding box
/// centered. Both loops have their gains scaled by how far the person appears to be relative to
/// the orbit radius, so corrections get stronger as the person grows in the frame.
///
/// Needs the bounding box of the observation. Without one (or with a degenerate one) the drone
/// holds still. The error state uses the `x` and `y` axes.
#[derive(Debug, Clone)]
pub struct HumanCircler {
    config: CircleConfig,
}

impl HumanCircler {
    pub fn new(config: CircleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CircleConfig {
        &self.config
    }

    fn axis(&self, focal_length: f32, bbox_side: f32) -> PdAxis {
        let apparent_distance = focal_length / bbox_side;
        let ratio = self.config.target_distance / apparent_distance;
        PdAxis::new(self.config.gains.scaled(ratio), self.config.limit)
    }
}

impl Default for HumanCircler {
    fn default() -> Self {
        Self::new(CircleConfig::default())
    }
}

impl Tracker for HumanCircler {
    fn track(&self, obs: &Observation, previous: ErrorState, enabled: bool) -> TrackOutput {
        if !enabled || !obs.detected {
            return TrackOutput::IDLE;
        }
        let Some(bbox) = obs.bbox else {
            return TrackOutput::IDLE;
        };

        let (x1, y1) = (bbox.x() as i32, bbox.y() as i32);
        let (x2, y2) = (bbox.x_max() as i32, bbox.y_max() as i32);
        let (width, height) = (x2 - x1, y2 - y1);
        if width <= 0 || height <= 0 {
            return TrackOutput::IDLE;
        }

        let yaw_axis = self.axis(self.config.horizontal_focal_length, width as f32);
        let vertical_axis = self.axis(self.config.vertical_focal_length, height as f32);

        let (mid_x, mid_y) = self.config.resolution.center();
        let error_x = (x1 + x2) / 2 - mid_x;
        let error_y = (y1 + y2) / 2 - mid_y;

        let yaw = yaw_axis.output(error_x as f32, previous.x as f32);
        // Image Y points down; a person below center means descending.
        let up_down = -vertical_axis.output(error_y as f32, previous.y as f32);

        TrackOutput {
            error: ErrorState {
                x: error_x,
                y: error_y,
                z: 0,
            },
            command: VelocityCommand::new(-self.config.circle_speed, 0, up_down, yaw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rect;

    fn person(x1: f32, y1: f32, x2: f32, y2: f32) -> Observation {
        let bbox = Rect::from_corners((x1, y1), (x2, y2));
        let (cx, cy) = bbox.center();
        Observation::found((cx as i32, cy as i32), y2 - y1, Some(bbox))
    }

    #[test]
    fn centered_person_orbits() {
        let out = HumanCircler::default().track(
            &person(540.0, 160.0, 740.0, 560.0),
            ErrorState::ZERO,
            true,
        );
        assert_eq!(out.command, VelocityCommand::new(-15, 0, 0, 0));
        assert_eq!(out.error, ErrorState::ZERO);
    }

    #[test]
    fn gains_scale_with_box_size() {
        let circler = HumanCircler::default();

        // 40 px wide => ratio 1.5·40/443.61 ≈ 0.135
        let small = circler.track(&person(720.0, 340.0, 760.0, 380.0), ErrorState::ZERO, true);
        // 200 px wide => ratio 1.5·200/443.61 ≈ 0.676
        let large = circler.track(&person(640.0, 260.0, 840.0, 460.0), ErrorState::ZERO, true);

        assert_eq!(small.error.x, 100);
        assert_eq!(large.error.x, 100);
        assert_eq!(small.command.yaw, 4);
        assert_eq!(large.command.yaw, 20);
    }

    #[test]
    fn climbs_down_towards_low_person() {
        // 400 px tall box centered 100 px below the middle => ratio 1.5·400/591.48 ≈ 1.014
        let out = HumanCircler::default().track(
            &person(540.0, 260.0, 740.0, 660.0),
            ErrorState::ZERO,
            true,
        );
        assert_eq!(out.error.y, 100);
        assert_eq!(out.command.up_down, -30);
    }

    #[test]
    fn commands_are_clamped() {
        let out = HumanCircler::default().track(
            &person(0.0, 0.0, 1280.0, 400.0),
            ErrorState { x: -500, y: 500, z: 0 },
            true,
        );
        assert_eq!(out.command.yaw, 50);
        assert_eq!(out.command.up_down, 50);
    }

    #[test]
    fn holds_without_box() {
        let circler = HumanCircler::default();
        let no_box = Observation::found((640, 360), 200.0, None);
        assert_eq!(circler.track(&no_box, ErrorState::ZERO, true), TrackOutput::IDLE);
        assert_eq!(
            circler.track(&Observation::MISSED, ErrorState::ZERO, true),
            TrackOutput::IDLE
        );

        let flat = person(100.0, 200.0, 300.0, 200.0);
        assert_eq!(circler.track(&flat, ErrorState::ZERO, true), TrackOutput::IDLE);
    }

    #[test]
    fn gate_closed() {
        let out = HumanCircler::default().track(
            &person(540.0, 160.0, 740.0, 560.0),
            ErrorState::ZERO,
            false,
        );
        assert_eq!(out, TrackOutput::IDLE);
    }
}

//! Monocular distance and height estimation.
//!
//! A person of known height `H` whose bounding box is `h` pixels tall in an image of `N` pixel rows
//! is, according to the pinhole camera model, at a distance of
//!
//! ```text
//! d = H·N / (2·h·tan(fov/2))
//! ```
//!
//! where `fov` is the vertical field of view of the camera. The vertical angle between the
//! optical axis and the bounding box center then tells how far the camera sits above or below
//! the top of the person.
//!
//! All lengths are in the unit the person height is given in (centimeters, in practice).

/// Intrinsics of the camera, as far as distance estimation is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraGeometry {
    pub sensor_height_mm: f32,
    pub focal_length_mm: f32,
    pub image_height_px: u32,
}

impl Default for CameraGeometry {
    /// Returns the geometry of the drone's front camera when streaming 720p.
    fn default() -> Self {
        Self {
            sensor_height_mm: 3.6,
            focal_length_mm: 3.61,
            image_height_px: 720,
        }
    }
}

impl CameraGeometry {
    /// Returns the vertical field of view, in radians.
    pub fn vertical_fov(&self) -> f32 {
        2.0 * ((self.sensor_height_mm / 2.0) / self.focal_length_mm).atan()
    }

    /// Derives the pinhole model used for the per-frame estimates.
    pub fn pinhole(&self) -> Pinhole {
        let fov = self.vertical_fov();
        Pinhole {
            fov,
            half_fov_tan: (fov / 2.0).tan(),
            rows: self.image_height_px as f32,
        }
    }
}

/// The pinhole model of a [`CameraGeometry`], with the field of view precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinhole {
    fov: f32,
    half_fov_tan: f32,
    rows: f32,
}

impl Pinhole {
    /// Returns the vertical field of view, in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Estimates the distance to a person of height `person_height` whose bounding box is
    /// `bbox_height_px` pixels tall.
    ///
    /// Returns [`None`] if the bounding box height is not strictly positive (no detection) or
    /// the estimate is not a finite number.
    pub fn distance(&self, person_height: f32, bbox_height_px: f32) -> Option<f32> {
        if !(bbox_height_px > 0.0) {
            return None;
        }

        let distance = (person_height * self.rows) / (2.0 * bbox_height_px * self.half_fov_tan);
        distance.is_finite().then_some(distance)
    }

    /// Estimates the height of the camera above the ground, given the person's height, the
    /// vertical pixel position of their bounding box center, and their distance.
    pub fn drone_height(&self, person_height: f32, center_y: f32, distance: f32) -> f32 {
        let angle = (self.rows / 2.0 - center_y) * (self.fov / self.rows);
        person_height - angle.tan() * distance
    }

    /// Returns the bounding box height (in pixels) at which a person of height `person_height`
    /// is at `distance`.
    ///
    /// This is the inverse of [`Pinhole::distance`].
    pub fn bbox_height_at(&self, person_height: f32, distance: f32) -> f32 {
        (person_height * self.rows) / (2.0 * distance * self.half_fov_tan)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn field_of_view() {
        let fov = CameraGeometry::default().vertical_fov();
        assert_relative_eq!(fov, 2.0 * (1.8f32 / 3.61).atan());
        assert_relative_eq!(fov.to_degrees(), 53.003, epsilon = 0.01);
        assert_eq!(CameraGeometry::default().pinhole().fov(), fov);
    }

    #[test]
    fn distance_round_trip() {
        let geom = CameraGeometry::default().pinhole();
        for expected in [150.0, 250.0, 400.0, 1000.0] {
            let bbox = geom.bbox_height_at(180.0, expected);
            let distance = geom.distance(180.0, bbox).unwrap();
            assert_relative_eq!(distance, expected, max_relative = 1e-5);
        }
    }

    #[test]
    fn person_filling_the_frame() {
        let geom = CameraGeometry::default().pinhole();
        let tan = (geom.fov() / 2.0).tan();
        // 720 px tall person => H / (2·tan(fov/2))
        let distance = geom.distance(180.0, 720.0).unwrap();
        assert_relative_eq!(distance, 180.0 / (2.0 * tan), max_relative = 1e-6);
    }

    #[test]
    fn zero_height_bbox_has_no_distance() {
        let geom = CameraGeometry::default().pinhole();
        assert_eq!(geom.distance(180.0, 0.0), None);
        assert_eq!(geom.distance(180.0, -3.0), None);
        assert_eq!(geom.distance(180.0, f32::NAN), None);
    }

    #[test]
    fn centered_person_means_camera_at_person_height() {
        let geom = CameraGeometry::default().pinhole();
        assert_relative_eq!(geom.drone_height(180.0, 360.0, 300.0), 180.0);
    }

    #[test]
    fn person_below_center_means_camera_is_higher() {
        let geom = CameraGeometry::default().pinhole();
        let above = geom.drone_height(180.0, 500.0, 300.0);
        let below = geom.drone_height(180.0, 200.0, 300.0);
        assert!(above > 180.0, "{above}");
        assert!(below < 180.0, "{below}");
    }
}

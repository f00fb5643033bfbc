use std::fmt;

/// An axis-aligned rectangle.
///
/// Used for bounding boxes, both in relative (`0.0..=1.0`) and in absolute pixel coordinates.
///
/// Rectangles are allowed to have zero height and/or width. Negative dimensions are not allowed.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect {
    x_center: f32,
    y_center: f32,
    width: f32,
    height: f32,
}

impl Rect {
    /// Creates a rectangle extending outwards from a center point.
    #[inline]
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Creates a rectangle extending downwards and right from a point.
    #[inline]
    pub fn from_top_left(top_left_x: f32, top_left_y: f32, width: f32, height: f32) -> Self {
        Self::from_center(
            top_left_x + width * 0.5,
            top_left_y + height * 0.5,
            width,
            height,
        )
    }

    /// Creates a rectangle from two opposing corners.
    ///
    /// The corners may be given in any order.
    pub fn from_corners((x1, y1): (f32, f32), (x2, y2): (f32, f32)) -> Self {
        let (x_min, x_max) = (x1.min(x2), x1.max(x2));
        let (y_min, y_max) = (y1.min(y2), y1.max(y2));
        Self::from_top_left(x_min, y_min, x_max - x_min, y_max - y_min)
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x_center - self.width * 0.5
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y_center - self.height * 0.5
    }

    #[inline]
    pub fn x_max(&self) -> f32 {
        self.x_center + self.width * 0.5
    }

    #[inline]
    pub fn y_max(&self) -> f32 {
        self.y_center + self.height * 0.5
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x_center, self.y_center)
    }

    /// Scales the X and Y coordinates (and sizes) of `self` independently.
    ///
    /// This maps a relative bounding box to pixel coordinates when passed the frame size.
    #[must_use]
    pub fn scale_by(&self, x_scale: f32, y_scale: f32) -> Self {
        Self {
            x_center: self.x_center * x_scale,
            y_center: self.y_center * y_scale,
            width: self.width * x_scale,
            height: self.height * y_scale,
        }
    }

    /// Computes the intersection of `self` and `other`.
    ///
    /// Returns [`None`] when the intersection is empty (ie. the rectangles do not overlap).
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x_min = self.x().max(other.x());
        let y_min = self.y().max(other.y());
        let x_max = self.x_max().min(other.x_max());
        let y_max = self.y_max().min(other.y_max());
        if x_min > x_max || y_min > y_max {
            return None;
        }

        Some(Rect::from_corners((x_min, y_min), (x_max, y_max)))
    }

    fn intersection_area(&self, other: &Self) -> f32 {
        self.intersection(other).map_or(0.0, |rect| rect.area())
    }

    fn union_area(&self, other: &Self) -> f32 {
        self.area() + other.area() - self.intersection_area(other)
    }

    /// Computes the Intersection over Union (IOU) of `self` and `other`.
    ///
    /// Two empty rectangles have an IOU of 0.
    pub fn iou(&self, other: &Self) -> f32 {
        let union = self.union_area(other);
        if union <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / union
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect @ ({},{})/{}x{}",
            self.x_center, self.y_center, self.width, self.height,
        )
    }
}

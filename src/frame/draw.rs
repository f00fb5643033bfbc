use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle},
    text::{self, Text, TextStyleBuilder},
};

use super::{Color, Frame, Rect};

/// Guard returned by [`draw_rect`]; draws the rectangle when dropped and allows customization.
pub struct DrawRect<'a> {
    frame: &'a mut Frame,
    rect: Rect,
    color: Color,
    stroke_width: u32,
}

impl DrawRect<'_> {
    /// Sets the rectangle's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the rectangle's stroke width.
    ///
    /// By default, a stroke width of 2 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl Drop for DrawRect<'_> {
    fn drop(&mut self) {
        let top_left = Point::new(self.rect.x().round() as i32, self.rect.y().round() as i32);
        let size = Size::new(
            self.rect.width().round().max(0.0) as u32,
            self.rect.height().round().max(0.0) as u32,
        );
        let style = PrimitiveStyle::with_stroke(self.color, self.stroke_width);
        render(self.frame, Rectangle::new(top_left, size).into_styled(style));
    }
}

/// Guard returned by [`draw_marker`]; draws the marker when dropped and allows customization.
pub struct DrawMarker<'a> {
    frame: &'a mut Frame,
    x: i32,
    y: i32,
    color: Color,
    radius: u32,
}

impl DrawMarker<'_> {
    /// Sets the marker's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the radius of the marker dot.
    ///
    /// The default radius is 5.
    pub fn radius(&mut self, radius: u32) -> &mut Self {
        self.radius = radius;
        self
    }
}

impl Drop for DrawMarker<'_> {
    fn drop(&mut self) {
        let dot = Circle::with_center(Point::new(self.x, self.y), self.radius * 2 + 1);
        render(self.frame, dot.into_styled(PrimitiveStyle::with_fill(self.color)));
    }
}

/// Guard returned by [`draw_text`]; draws the text when dropped and allows customization.
pub struct DrawText<'a> {
    frame: &'a mut Frame,
    x: i32,
    y: i32,
    text: &'a str,
    color: Color,
    alignment: text::Alignment,
    baseline: text::Baseline,
}

impl DrawText<'_> {
    /// Sets the text color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Aligns the bottom of the text with the `y` coordinate.
    pub fn align_bottom(&mut self) -> &mut Self {
        self.baseline = text::Baseline::Bottom;
        self
    }

    /// Aligns the left side of the text with the `x` coordinate.
    pub fn align_left(&mut self) -> &mut Self {
        self.alignment = text::Alignment::Left;
        self
    }
}

impl Drop for DrawText<'_> {
    fn drop(&mut self) {
        // Labels are ASCII only; the font has no glyphs beyond that.
        let font = MonoTextStyle::new(&FONT_10X20, self.color);
        let layout = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(self.baseline)
            .build();
        let anchor = Point::new(self.x, self.y);
        render(self.frame, Text::with_text_style(self.text, anchor, font, layout));
    }
}

/// Draws a rectangle (given in pixel coordinates) onto a frame.
pub fn draw_rect(frame: &mut Frame, rect: Rect) -> DrawRect<'_> {
    DrawRect {
        frame,
        rect,
        color: Color::GREEN,
        stroke_width: 2,
    }
}

/// Draws a filled dot onto a frame.
///
/// This is used to visualize the tracked center point.
pub fn draw_marker(frame: &mut Frame, x: i32, y: i32) -> DrawMarker<'_> {
    DrawMarker {
        frame,
        x,
        y,
        color: Color::GREEN,
        radius: 5,
    }
}

/// Draws a text string onto a frame.
///
/// By default, the text is drawn centered horizontally and vertically around `x` and `y`.
pub fn draw_text<'a>(frame: &'a mut Frame, x: i32, y: i32, text: &'a str) -> DrawText<'a> {
    DrawText {
        frame,
        x,
        y,
        text,
        color: Color::RED,
        alignment: text::Alignment::Center,
        baseline: text::Baseline::Middle,
    }
}

fn render<D: Drawable<Color = Color>>(frame: &mut Frame, drawable: D) {
    match drawable.draw(&mut Canvas(frame)) {
        Ok(_) => {}
        Err(never) => match never {},
    }
}

/// Adapts a [`Frame`] to `embedded-graphics`, clipping everything outside of it.
struct Canvas<'a>(&'a mut Frame);

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.0.set(point.x as u32, point.y as u32, color);
            }
        }
        Ok(())
    }
}

//! Video frames.
//!
//! This module provides:
//!
//! - The [`Frame`] type, an owned 8-bit RGB image.
//! - [`Rect`], a floating-point axis-aligned rectangle used for bounding boxes.
//! - A variety of freestanding `draw_*` functions used to annotate frames for display.

mod draw;
mod rect;

use std::{fmt, path::Path};

use anyhow::Context;
use embedded_graphics::{pixelcolor::raw::RawU24, prelude::PixelColor};
use image::{imageops::FilterType, ImageBuffer, Rgb, RgbImage};

use crate::resolution::Resolution;

pub use draw::*;
pub use rect::*;

/// An 8-bit RGB video frame.
///
/// Detectors borrow frames immutably while the inference capability runs; annotations are always
/// drawn onto a separate copy. The caller's frame is therefore never mutated by a detector and
/// can be reused (eg. by the recorder) as soon as the call returns.
#[derive(Clone)]
pub struct Frame {
    buf: RgbImage,
}

impl Frame {
    /// Creates a black frame of a specified size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: ImageBuffer::new(width, height),
        }
    }

    /// Creates a frame filled with a single color.
    pub fn filled(resolution: Resolution, color: Color) -> Self {
        Self {
            buf: ImageBuffer::from_pixel(
                resolution.width(),
                resolution.height(),
                Rgb([color.r(), color.g(), color.b()]),
            ),
        }
    }

    /// Wraps an existing RGB buffer.
    pub fn from_rgb(buf: RgbImage) -> Self {
        Self { buf }
    }

    /// Loads a frame from an image file, converting it to RGB.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let buf = image::open(path)
            .with_context(|| format!("failed to load frame from '{}'", path.display()))?
            .to_rgb8();
        Ok(Self { buf })
    }

    /// Saves the frame to the file system.
    ///
    /// The image format is derived from the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.buf
            .save(path)
            .with_context(|| format!("failed to save frame to '{}'", path.display()))
    }

    /// Returns the width of this frame, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    /// Returns the height of this frame, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Returns the color of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside of the frame.
    pub fn get(&self, x: u32, y: u32) -> Color {
        let Rgb([r, g, b]) = *self.buf.get_pixel(x, y);
        Color::from_rgb8(r, g, b)
    }

    /// Sets the pixel at `(x, y)` to `color`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside of the frame.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.buf.put_pixel(x, y, Rgb([color.r(), color.g(), color.b()]));
    }

    /// Returns a resized copy of `self`.
    ///
    /// The copy is what gets handed to inference capabilities, so the caller's frame stays
    /// untouched.
    pub fn resized(&self, resolution: Resolution) -> Frame {
        if resolution == self.resolution() {
            return self.clone();
        }

        Frame {
            buf: image::imageops::resize(
                &self.buf,
                resolution.width(),
                resolution.height(),
                FilterType::Triangle,
            ),
        }
    }

    /// Returns the underlying RGB buffer.
    #[inline]
    pub fn as_rgb(&self) -> &RgbImage {
        &self.buf
    }

    /// Returns the raw pixel data, 3 bytes per pixel in row-major order.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.buf.as_raw()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.resolution())
    }
}

/// An 8-bit sRGB color.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Color(pub(crate) [u8; 3]);

impl Color {
    pub const BLACK: Self = Self([0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255]);
    pub const RED: Self = Self([255, 0, 0]);
    pub const GREEN: Self = Self([0, 255, 0]);
    pub const BLUE: Self = Self([0, 0, 255]);
    pub const YELLOW: Self = Self([255, 255, 0]);

    #[inline]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r(), self.g(), self.b())
    }
}

// FIXME leaks `embedded-graphics` dependency
impl PixelColor for Color {
    type Raw = RawU24;
}

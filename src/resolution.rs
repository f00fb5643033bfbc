//! Types for representing image resolutions.

use std::{fmt, str::FromStr};

/// Resolution (`width x height`) of a frame, camera, or network input.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    /// 720p resolution: `1280x720`
    ///
    /// This is what the drone's camera streams.
    pub const RES_720P: Self = Self {
        width: 1280,
        height: 720,
    };

    /// `640x480`, the input size used by the face detection network.
    pub const RES_VGA: Self = Self {
        width: 640,
        height: 480,
    };

    /// Creates a new [`Resolution`] of `width x height`.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the width of this [`Resolution`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of this [`Resolution`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn num_pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns the pixel at the center of the resolution, rounding down.
    ///
    /// Trackers measure their horizontal and vertical errors against this point.
    #[inline]
    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Parses the `WIDTHxHEIGHT` notation used by model listings (eg. `640x640`).
impl FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseResolutionError {
            input: s.to_string(),
        };
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(err)?;
        let width = w.trim().parse::<u32>().map_err(|_| err())?;
        let height = h.trim().parse::<u32>().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self::new(width, height))
    }
}

/// Error returned when parsing a [`Resolution`] from a string fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid resolution `{input}` (expected `WIDTHxHEIGHT`)")]
pub struct ParseResolutionError {
    input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolution() {
        assert_eq!("640x640".parse::<Resolution>().unwrap(), Resolution::new(640, 640));
        assert_eq!(" 320X240 ".parse::<Resolution>().unwrap(), Resolution::new(320, 240));
        assert!("640".parse::<Resolution>().is_err());
        assert!("0x480".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn display_roundtrips_model_notation() {
        assert_eq!(Resolution::RES_720P.to_string(), "1280x720");
    }

    #[test]
    fn center_rounds_down() {
        assert_eq!(Resolution::RES_720P.center(), (640, 360));
        assert_eq!(Resolution::new(5, 3).center(), (2, 1));
    }
}

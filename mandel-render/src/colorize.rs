//! Mapping escape values to pixel colors.

use std::{fmt, str::FromStr};

use image::{Rgb, RgbImage};
use mandel_core::Size;

use crate::Error;

/// Turns an escape value in `[0, 1]` into a color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Colorizer {
    /// One color for points that escaped, another for points that did not.
    Binary { outside: Rgb<u8>, inside: Rgb<u8> },
    /// Linear gradient from `low` (escaped immediately) to `high` (never escaped).
    Gradient { low: Rgb<u8>, high: Rgb<u8> },
}

impl Default for Colorizer {
    fn default() -> Self {
        Colorizer::Gradient {
            low: Rgb([0, 0, 0]),
            high: Rgb([255, 255, 255]),
        }
    }
}

impl Colorizer {
    pub fn color(&self, value: f32) -> Rgb<u8> {
        match *self {
            Colorizer::Binary { outside, inside } => {
                if value < 1.0 {
                    outside
                } else {
                    inside
                }
            }
            Colorizer::Gradient { low, high } => {
                if value <= 0.0 {
                    return low;
                } else if value >= 1.0 {
                    return high;
                }
                let mut out = [0u8; 3];
                for ((slot, lo), hi) in out.iter_mut().zip(low.0).zip(high.0) {
                    let (lo, hi) = (lo as f32 / 255.0, hi as f32 / 255.0);
                    let channel = (lo + value * (hi - lo)) * 255.0 + 0.5;
                    *slot = num::clamp(channel, 0.0, 255.0) as u8;
                }
                Rgb(out)
            }
        }
    }

    /// Colors a full buffer of escape values, row-major.
    ///
    /// The `data` slice must be `size.width * size.height` entries long.
    pub fn render(&self, size: Size, data: &[f32]) -> Result<RgbImage, Error> {
        let (width, height) = match (u32::try_from(size.width), u32::try_from(size.height)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "image too large: {} x {}",
                    size.width, size.height
                )))
            }
        };
        if data.len() != size.area() {
            return Err(Error::InvalidArgument(format!(
                "data size != width * height: {} != {} * {}",
                data.len(),
                size.width,
                size.height
            )));
        }

        let mut img = RgbImage::new(width, height);
        img.pixels_mut()
            .zip(data)
            .for_each(|(pixel, value)| {
                *pixel = self.color(*value);
            });
        Ok(img)
    }
}

/// A color option that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorError(String);

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse color option '{}'", self.0)
    }
}

impl std::error::Error for ColorError {}

fn parse_hex(s: &str) -> Option<Rgb<u8>> {
    let digits = s.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

impl FromStr for Colorizer {
    type Err = ColorError;

    /// Parses `#rrggbb,#rrggbb` (or `;`) as a binary colorizer, outside
    /// color first, and `#rrggbb..#rrggbb` (or `...`) as a gradient.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pair = |a: &str, b: &str| Some((parse_hex(a)?, parse_hex(b)?));

        let gradient = ["...", ".."]
            .iter()
            .filter_map(|sep| s.split_once(*sep))
            .find_map(|(a, b)| pair(a, b));
        if let Some((low, high)) = gradient {
            return Ok(Colorizer::Gradient { low, high });
        }
        let binary = s
            .split_once(&[',', ';'][..])
            .and_then(|(a, b)| pair(a, b));
        if let Some((outside, inside)) = binary {
            return Ok(Colorizer::Binary { outside, inside });
        }
        Err(ColorError(s.to_owned()))
    }
}

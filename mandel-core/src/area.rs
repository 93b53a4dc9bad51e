//! The rectangle of the complex plane being plotted, and its mapping to pixels.

use std::str::FromStr;

use num::ToPrimitive;

use crate::{error::AreaError, Size};

/// A rectangle on the complex plane: real axis `left..right`,
/// imaginary axis `bottom..top`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl PlotArea {
    pub const fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        PlotArea {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Image dimensions when plotting at `resolution` pixels per unit.
    ///
    /// Each side must fit a `u32` and the pixel count a `usize`.
    pub fn size(&self, resolution: f64) -> Result<Size, AreaError> {
        let width = ((self.right - self.left) * resolution).floor();
        let height = ((self.top - self.bottom) * resolution).floor();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(AreaError::Empty { width, height });
        }
        let too_large = AreaError::TooLarge { width, height };
        let side = |len: f64| len.to_u32().and_then(|len| len.to_usize());
        let (w, h) = match (side(width), side(height)) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(too_large),
        };
        if w.checked_mul(h).is_none() {
            return Err(too_large);
        }
        Ok(Size {
            width: w,
            height: h,
        })
    }

    /// The point of the complex plane sampled for a pixel.
    ///
    /// Row 0 is the top edge, column 0 the left edge.
    #[inline]
    pub fn point(&self, size: Size, row: usize, column: usize) -> (f64, f64) {
        let x = self.left + (self.right - self.left) * column as f64 / size.width as f64;
        let y = self.top + (self.bottom - self.top) * row as f64 / size.height as f64;
        (x, y)
    }
}

impl FromStr for PlotArea {
    type Err = AreaError;

    /// Parses `left;right;bottom;top`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(';').collect();
        if parts.len() != 4 {
            return Err(AreaError::WrongArity(parts.len()));
        }
        let mut values = [0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .trim()
                .parse()
                .map_err(|_| AreaError::InvalidNumber(part.to_string()))?;
        }
        let [left, right, bottom, top] = values;
        Ok(PlotArea::new(left, right, bottom, top))
    }
}

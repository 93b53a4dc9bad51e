//! Library code for Mandel: complex arithmetic, the formula language, and
//! escape-time fractal sets.

pub mod area;
pub mod complex;
pub mod error;
pub mod formula;
pub mod fractal;

pub use area::PlotArea;
pub use complex::Complex;
pub use fractal::{FractalSet, SetKind, Transform};

/// A pair of integer (width, height) dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

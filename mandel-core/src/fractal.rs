//! Escape-time fractals: transforms, the Mandelbrot and Julia sets, and
//! the per-pixel escape loop.

use std::fmt;

use crate::{
    area::PlotArea,
    complex::Complex,
    error::{EvalError, FormulaError},
    formula::{self, Node},
};

mod builder;
pub use builder::DEFAULT_JULIA_PARAMETER;

/// Squared-modulus threshold past which a sequence is considered divergent.
pub const BOUND: f64 = 4.0;

/// The step function `(z, c) -> next z` iterated for every point.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
    /// `z^2 + c`, without going through the formula evaluator.
    Quadratic,
    /// A reduced formula over the variables `z` and `c`.
    Formula(Node),
}

impl Transform {
    /// Parses and reduces a formula over `z` and `c`.
    pub fn formula(input: &str) -> Result<Transform, FormulaError> {
        let root = formula::parse(input)?.reduce()?;
        Ok(Transform::Formula(root))
    }

    #[inline]
    pub fn apply(&self, z: Complex, c: Complex) -> Result<Complex, EvalError> {
        match self {
            Transform::Quadratic => Ok(c + z * z),
            Transform::Formula(root) => root.compute(&[("z", z), ("c", c)]),
        }
    }
}

/// Which family member is being plotted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SetKind {
    /// The probed point is the parameter of the sequence.
    Mandelbrot,
    /// The probed point starts the sequence; the parameter is fixed.
    Julia(Complex),
}

impl SetKind {
    pub const MANDELBROT: &'static str = "mandelbrot";
    pub const JULIA: &'static str = "julia";

    /// The rectangle shown when no area is requested.
    pub fn default_area(&self) -> PlotArea {
        match self {
            SetKind::Mandelbrot => PlotArea::new(-2.0, 1.0, -1.0, 1.0),
            SetKind::Julia(_) => PlotArea::new(-1.5, 1.5, -1.0, 1.0),
        }
    }
}

/// A configured escape-time fractal.
///
/// Immutable once built; render threads share it by reference.
#[derive(Clone, Debug, PartialEq)]
pub struct FractalSet {
    kind: SetKind,
    transform: Transform,
    iterations: u32,
}

impl FractalSet {
    pub fn mandelbrot(transform: Transform, iterations: u32) -> Self {
        FractalSet {
            kind: SetKind::Mandelbrot,
            transform,
            iterations,
        }
    }

    pub fn julia(transform: Transform, c: Complex, iterations: u32) -> Self {
        FractalSet {
            kind: SetKind::Julia(c),
            transform,
            iterations,
        }
    }

    pub fn kind(&self) -> SetKind {
        self.kind
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn default_area(&self) -> PlotArea {
        self.kind.default_area()
    }

    /// Iterates the transform from the point (x, y) until it escapes.
    ///
    /// Returns the escape iteration divided by the budget, in `[0, 1)`,
    /// or `1.0` if the sequence stayed bounded for the whole budget.
    pub fn escape_value(&self, x: f64, y: f64) -> Result<f32, EvalError> {
        let point = Complex::new(x, y);
        let parameter = match self.kind {
            SetKind::Mandelbrot => point,
            SetKind::Julia(c) => c,
        };
        let mut current = point;
        for i in 0..self.iterations {
            if current.norm_sqr() > BOUND {
                return Ok(i as f32 / self.iterations as f32);
            }
            current = self.transform.apply(current, parameter)?;
        }
        Ok(1.0)
    }
}

impl fmt::Display for FractalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SetKind::Mandelbrot => write!(f, "Mandelbrot set"),
            SetKind::Julia(c) => write!(f, "Julia set ({} + {}i)", c.re, c.im),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArithmeticError;

    #[test]
    fn origin_never_escapes() {
        let set = FractalSet::mandelbrot(Transform::Quadratic, 80);
        assert_eq!(set.escape_value(0.0, 0.0), Ok(1.0));
    }

    #[test]
    fn escape_iteration_is_normalized() {
        let set = FractalSet::mandelbrot(Transform::Quadratic, 10);
        // Already outside the bound.
        assert_eq!(set.escape_value(3.0, 0.0), Ok(0.0));
        // z0 = 1, z1 = 1 + 1 = 2 (|z|^2 = 4, not past the bound), z2 = 4 + 1 = 5.
        assert_eq!(set.escape_value(1.0, 0.0), Ok(0.2));
        // z0 = 1.5, z1 = 2.25 + 1.5 = 3.75.
        assert_eq!(set.escape_value(1.5, 0.0), Ok(0.1));
    }

    #[test]
    fn julia_uses_fixed_parameter() {
        let set = FractalSet::julia(Transform::Quadratic, Complex::new(1.0, 0.0), 10);
        // z0 = 0, z1 = 1, z2 = 2, z3 = 5.
        assert_eq!(set.escape_value(0.0, 0.0), Ok(0.3));

        let set = FractalSet::julia(Transform::Quadratic, Complex::new(0.0, 0.0), 50);
        assert_eq!(set.escape_value(0.5, 0.5), Ok(1.0));
    }

    #[test]
    fn formula_matches_builtin() {
        let builtin = FractalSet::mandelbrot(Transform::Quadratic, 40);
        let custom = FractalSet::mandelbrot(Transform::formula("z^2+c").unwrap(), 40);
        for row in 0..20 {
            for column in 0..30 {
                let x = -2.0 + 0.1 * column as f64;
                let y = 1.0 - 0.1 * row as f64;
                assert_eq!(builtin.escape_value(x, y), custom.escape_value(x, y));
            }
        }
    }

    #[test]
    fn formula_errors_surface() {
        let set = FractalSet::mandelbrot(Transform::formula("z/(c-c)").unwrap(), 10);
        assert_eq!(
            set.escape_value(0.1, 0.1),
            Err(EvalError::Arithmetic(ArithmeticError::DivideByZero))
        );

        let set = FractalSet::mandelbrot(Transform::formula("z*w").unwrap(), 10);
        assert_eq!(
            set.escape_value(0.1, 0.1),
            Err(EvalError::UndefinedVariable("w".to_owned()))
        );
    }

    #[test]
    fn formula_folding_failure() {
        assert!(matches!(
            Transform::formula("z + 1/0"),
            Err(FormulaError::Eval(EvalError::Arithmetic(
                ArithmeticError::DivideByZero
            )))
        ));
    }

    #[test]
    fn display_names() {
        assert_eq!(
            FractalSet::mandelbrot(Transform::Quadratic, 1).to_string(),
            "Mandelbrot set"
        );
        assert_eq!(
            FractalSet::julia(Transform::Quadratic, Complex::new(-0.4, 0.6), 1).to_string(),
            "Julia set (-0.4 + 0.6i)"
        );
    }
}

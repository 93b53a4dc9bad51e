use std::{
    fmt,
    ops::{Add, ControlFlow, Mul, Neg, Sub},
};

use num::{ToPrimitive, Zero};

use crate::error::ArithmeticError;

/// Complex number over f64.
///
/// Only the operations the formula language needs are provided.
/// Equality is exact, component-wise.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ONE: Complex = Complex::new(1.0, 0.0);
    pub const E: Complex = Complex::new(std::f64::consts::E, 0.0);
    pub const I: Complex = Complex::new(0.0, 1.0);

    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Squared modulus, re^2 + im^2.
    /// Bound checks compare against this to skip a square root.
    #[inline]
    pub fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// Divides by `rhs`, failing when its modulus is exactly zero.
    pub fn checked_div(self, rhs: Complex) -> Result<Complex, ArithmeticError> {
        let denom = rhs.norm_sqr();
        if denom == 0.0 {
            return Err(ArithmeticError::DivideByZero);
        }
        // (a + ib) / (c + id) = (a + ib) * (c - id) / (c^2 + d^2)
        Ok(Complex {
            re: (self.re * rhs.re + self.im * rhs.im) / denom,
            im: (self.im * rhs.re - self.re * rhs.im) / denom,
        })
    }

    /// Raises to the power `exp`.
    ///
    /// Two cases are supported: an exponent that is a positive integer,
    /// computed by repeated multiplication, and a base of exactly `e`,
    /// computed with e^(x+iy) = e^x (cos y + i sin y).
    pub fn pow(self, exp: Complex) -> Result<Complex, ArithmeticError> {
        if let Some(n) = exp.positive_integer() {
            // Stops early once the product can no longer change.
            let product = (1..n).try_fold(self, |acc, _| {
                let next = acc * self;
                if next.is_finite() && !next.is_zero() {
                    ControlFlow::Continue(next)
                } else {
                    ControlFlow::Break(next)
                }
            });
            return Ok(match product {
                ControlFlow::Continue(value) | ControlFlow::Break(value) => value,
            });
        }
        if self == Complex::E {
            let r = exp.re.exp();
            return Ok(Complex::new(r * exp.im.cos(), r * exp.im.sin()));
        }
        Err(ArithmeticError::UnsupportedPower)
    }

    /// Factorial of a non-negative integer; 0! = 1.
    pub fn factorial(self) -> Result<Complex, ArithmeticError> {
        let n = self
            .integer()
            .and_then(|re| re.to_u64())
            .ok_or(ArithmeticError::InvalidFactorial)?;
        // 171! and up overflow to infinity.
        let product = (2..=n)
            .try_fold(1.0, |acc: f64, k| Some(acc * k as f64).filter(|p| p.is_finite()))
            .unwrap_or(f64::INFINITY);
        Ok(Complex::new(product, 0.0))
    }

    fn is_finite(&self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    /// The real part, if this number lies on the real axis at an integer.
    fn integer(&self) -> Option<f64> {
        if self.im == 0.0 && self.re == self.re.round() {
            Some(self.re)
        } else {
            None
        }
    }

    fn positive_integer(&self) -> Option<u32> {
        self.integer()
            .and_then(|re| re.to_u32())
            .filter(|n| *n >= 1)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}i", self.re, self.im)
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl Add<Complex> for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl Sub<Complex> for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl Mul<Complex> for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Self {
        // (a + ib) * (c + id)
        // = ac + aid + (ibc + i^2 bd)      (FOIL)
        // = (ac - bd) + i(ad + bc)
        let (a, b) = (self.re, self.im);
        let (c, d) = (rhs.re, rhs.im);
        Self {
            re: a * c - b * d,
            im: a * d + b * c,
        }
    }
}

impl Zero for Complex {
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}

use crate::{
    complex::Complex,
    error::SetError,
    fractal::{FractalSet, SetKind, Transform},
};

/// Julia parameter used when none is given.
pub const DEFAULT_JULIA_PARAMETER: Complex = Complex::new(-0.74543, 0.11301);

impl FractalSet {
    /// Resolves user-facing options into a set.
    ///
    /// - `name` is `mandelbrot` or `julia`, in any case.
    /// - `formula` replaces `z^2 + c` when not blank.
    /// - `param` is `re;im` for Julia sets (blank for the default), and must
    ///   be blank for the Mandelbrot set.
    pub fn build(
        name: &str,
        formula: &str,
        param: &str,
        iterations: u32,
    ) -> Result<FractalSet, SetError> {
        if iterations == 0 {
            return Err(SetError::ZeroIterations);
        }

        let transform = if formula.trim().is_empty() {
            Transform::Quadratic
        } else {
            let transform = Transform::formula(formula)?;
            if let Transform::Formula(root) = &transform {
                tracing::debug!(
                    formula,
                    constant = root.is_constant(),
                    "reduced custom transform"
                );
                tracing::trace!("reduced formula:\n{}", root.pretty());
            }
            transform
        };

        let set = match name.to_lowercase().as_str() {
            SetKind::MANDELBROT => {
                if !param.trim().is_empty() {
                    return Err(SetError::UnexpectedParameter("Mandelbrot"));
                }
                FractalSet::mandelbrot(transform, iterations)
            }
            SetKind::JULIA => {
                let c = if param.trim().is_empty() {
                    DEFAULT_JULIA_PARAMETER
                } else {
                    parse_parameter(param)?
                };
                FractalSet::julia(transform, c, iterations)
            }
            _ => return Err(SetError::UnknownSet(name.to_owned())),
        };
        tracing::debug!(%set, iterations, "built set");
        Ok(set)
    }
}

/// Parses a `re;im` pair.
fn parse_parameter(param: &str) -> Result<Complex, SetError> {
    let invalid = || SetError::InvalidParameter(param.to_owned());
    let (re, im) = param.split_once(';').ok_or_else(invalid)?;
    let re: f64 = re.trim().parse().map_err(|_| invalid())?;
    let im: f64 = im.trim().parse().map_err(|_| invalid())?;
    Ok(Complex::new(re, im))
}

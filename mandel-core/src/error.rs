//! Errors raised while parsing, evaluating and configuring fractals.

use std::{error::Error, fmt};

/// An operation that the complex arithmetic does not support.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticError {
    DivideByZero,
    UnsupportedPower,
    InvalidFactorial,
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivideByZero => write!(f, "divide by zero"),
            Self::UnsupportedPower => write!(f, "unsupported power operation"),
            Self::InvalidFactorial => write!(f, "factorial requires a non-negative integer"),
        }
    }
}

impl Error for ArithmeticError {}

/// Malformed formula text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    Empty,
    UnmatchedParenthesis,
    MissingOperands,
    UnmatchedOperands,
    UnrecognizedToken(String),
    /// Operators nest deeper than the given limit.
    TooDeep(usize),
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty formula"),
            Self::UnmatchedParenthesis => write!(f, "unmatched parenthesis"),
            Self::MissingOperands => write!(f, "missing operands"),
            Self::UnmatchedOperands => write!(f, "unmatched operands"),
            Self::UnrecognizedToken(token) => write!(f, "unrecognized token '{}'", token),
            Self::TooDeep(limit) => write!(f, "formula nests more than {} levels deep", limit),
        }
    }
}

impl Error for SyntaxError {}

/// Failure to evaluate a formula against a set of variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalError {
    Arithmetic(ArithmeticError),
    UndefinedVariable(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arithmetic(err) => write!(f, "{}", err),
            Self::UndefinedVariable(name) => write!(f, "no such variable {}", name),
        }
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arithmetic(err) => Some(err),
            Self::UndefinedVariable(_) => None,
        }
    }
}

impl From<ArithmeticError> for EvalError {
    fn from(err: ArithmeticError) -> Self {
        Self::Arithmetic(err)
    }
}

/// Failure to turn formula text into a reduced transform.
///
/// Parsing can fail on the text itself; constant folding can fail on
/// arithmetic, e.g. `z + 1/0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaError {
    Syntax(SyntaxError),
    Eval(EvalError),
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "invalid formula: {}", err),
            Self::Eval(err) => write!(f, "invalid formula: {}", err),
        }
    }
}

impl Error for FormulaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Eval(err) => Some(err),
        }
    }
}

impl From<SyntaxError> for FormulaError {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(err)
    }
}

impl From<EvalError> for FormulaError {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}

/// Invalid combination of set name, formula, parameter and iteration budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetError {
    UnknownSet(String),
    UnexpectedParameter(&'static str),
    InvalidParameter(String),
    Formula(FormulaError),
    ZeroIterations,
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSet(name) => write!(f, "unrecognized set '{}'", name),
            Self::UnexpectedParameter(set) => write!(f, "{} set does not take a parameter", set),
            Self::InvalidParameter(param) => {
                write!(f, "invalid parameter '{}' for Julia set", param)
            }
            Self::Formula(err) => write!(f, "{}", err),
            Self::ZeroIterations => write!(f, "iteration budget must be greater than zero"),
        }
    }
}

impl Error for SetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Formula(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FormulaError> for SetError {
    fn from(err: FormulaError) -> Self {
        Self::Formula(err)
    }
}

/// Malformed or degenerate plot rectangle.
#[derive(Clone, Debug, PartialEq)]
pub enum AreaError {
    WrongArity(usize),
    InvalidNumber(String),
    Empty { width: f64, height: f64 },
    /// More pixels than an image can address.
    TooLarge { width: f64, height: f64 },
}

impl fmt::Display for AreaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongArity(n) => write!(f, "area should consist of four numbers, got {}", n),
            Self::InvalidNumber(part) => write!(f, "could not parse plot area value '{}'", part),
            Self::Empty { width, height } => {
                write!(f, "plot area maps to an empty image ({} x {} pixels)", width, height)
            }
            Self::TooLarge { width, height } => {
                write!(
                    f,
                    "plot area maps to an image too large to render ({} x {} pixels)",
                    width, height
                )
            }
        }
    }
}

impl Error for AreaError {}

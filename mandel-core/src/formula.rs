//! Formula language: abstract syntax tree, evaluation and constant folding.
//!
//! A formula such as `z^2 + c` is parsed once into a [Node] tree, folded
//! once with [Node::reduce], and then evaluated for every pixel with
//! [Node::compute]. Trees are immutable after construction and can be
//! shared freely between render threads.

use num::Zero;

use crate::{
    complex::Complex,
    error::{ArithmeticError, EvalError},
};

mod parser;
pub use parser::{parse, MAX_DEPTH};

/// Operators of the formula language.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Negate,
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Factorial,
}

impl Operator {
    /// Number of operands the operator takes.
    pub const fn arity(self) -> usize {
        match self {
            Operator::Negate | Operator::Factorial => 1,
            _ => 2,
        }
    }

    /// Binding strength; higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            Operator::Factorial => 30,
            Operator::Negate => 25,
            Operator::Power => 20,
            Operator::Multiply | Operator::Divide => 15,
            Operator::Add | Operator::Subtract => 5,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Negate | Operator::Subtract => "-",
            Operator::Add => "+",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "^",
            Operator::Factorial => "!",
        }
    }

    /// Applies the operator to already-evaluated operands, in source order.
    fn apply(self, args: &[Complex]) -> Result<Complex, ArithmeticError> {
        match (self, args) {
            (Operator::Negate, [a]) => Ok(-*a),
            (Operator::Factorial, [a]) => a.factorial(),
            (Operator::Add, [a, b]) => Ok(*a + *b),
            (Operator::Subtract, [a, b]) => Ok(*a - *b),
            (Operator::Multiply, [a, b]) => Ok(*a * *b),
            (Operator::Divide, [a, b]) => a.checked_div(*b),
            (Operator::Power, [a, b]) => a.pow(*b),
            (op, args) => unreachable!(
                "operator {:?} applied to {} operands",
                op,
                args.len()
            ),
        }
    }
}

/// Variable bindings available while evaluating a formula.
pub trait Context {
    fn lookup(&self, name: &str) -> Option<Complex>;
}

/// A context binding no variables at all.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoVariables;

impl Context for NoVariables {
    fn lookup(&self, _name: &str) -> Option<Complex> {
        None
    }
}

impl Context for [(&str, Complex)] {
    fn lookup(&self, name: &str) -> Option<Complex> {
        self.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

impl<const N: usize> Context for [(&str, Complex); N] {
    #[inline]
    fn lookup(&self, name: &str) -> Option<Complex> {
        self.as_slice().lookup(name)
    }
}

/// A node of a formula's syntax tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// An operator and its operands, in source order.
    /// The operand count always equals the operator's arity.
    Operator { op: Operator, operands: Vec<Node> },
    Constant(Complex),
    Variable(String),
}

impl Node {
    /// Builds an operator node.
    ///
    /// Panics if `operands` does not match the operator's arity; the parser
    /// never produces such a node.
    pub fn operator(op: Operator, operands: Vec<Node>) -> Node {
        assert_eq!(
            operands.len(),
            op.arity(),
            "operator {} takes {} operands",
            op.symbol(),
            op.arity()
        );
        Node::Operator { op, operands }
    }

    /// Evaluates the tree, resolving variables against `context`.
    pub fn compute<C: Context + ?Sized>(&self, context: &C) -> Result<Complex, EvalError> {
        match self {
            Node::Constant(value) => Ok(*value),
            Node::Variable(name) => context
                .lookup(name)
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            Node::Operator { op, operands } => {
                let mut args = [Complex::zero(); 2];
                for (slot, operand) in args.iter_mut().zip(operands) {
                    *slot = operand.compute(context)?;
                }
                Ok(op.apply(&args[..operands.len()])?)
            }
        }
    }

    /// Folds every operator whose operands are all constants into a constant.
    ///
    /// Fails if folding hits an arithmetic error, e.g. `1/0`.
    pub fn reduce(&self) -> Result<Node, EvalError> {
        match self {
            Node::Operator { op, operands } => {
                let operands = operands
                    .iter()
                    .map(Node::reduce)
                    .collect::<Result<Vec<_>, _>>()?;
                let folded = Node::Operator { op: *op, operands };
                if folded.is_foldable() {
                    // No variables left below this node.
                    Ok(Node::Constant(folded.compute(&NoVariables)?))
                } else {
                    Ok(folded)
                }
            }
            leaf => Ok(leaf.clone()),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Node::Constant(_))
    }

    fn is_foldable(&self) -> bool {
        match self {
            Node::Operator { operands, .. } => operands.iter().all(Node::is_constant),
            _ => false,
        }
    }

    fn label(&self) -> String {
        match self {
            Node::Operator { op, .. } => op.symbol().to_owned(),
            Node::Constant(value) => value.to_string(),
            Node::Variable(name) => name.clone(),
        }
    }

    /// Renders the tree one node per line, for debugging.
    ///
    /// ```text
    /// └── +
    ///     ├── ^
    ///     │   ├── z
    ///     │   └── 2 + 0i
    ///     └── c
    /// ```
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(&mut out, "", true, true);
        out
    }

    fn pretty_into(&self, out: &mut String, prefix: &str, is_root: bool, is_last: bool) {
        out.push_str(prefix);
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(&self.label());
        out.push('\n');
        if let Node::Operator { operands, .. } = self {
            let child_prefix = match (is_root, is_last) {
                (true, _) | (false, true) => format!("{}    ", prefix),
                (false, false) => format!("{}│   ", prefix),
            };
            for (i, operand) in operands.iter().enumerate() {
                operand.pretty_into(out, &child_prefix, false, i + 1 == operands.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(re: f64, im: f64) -> Node {
        Node::Constant(Complex::new(re, im))
    }

    fn variable(name: &str) -> Node {
        Node::Variable(name.to_owned())
    }

    #[test]
    fn arity_and_precedence() {
        assert_eq!(Operator::Negate.arity(), 1);
        assert_eq!(Operator::Factorial.arity(), 1);
        assert_eq!(Operator::Power.arity(), 2);
        assert!(Operator::Factorial.precedence() > Operator::Negate.precedence());
        assert!(Operator::Negate.precedence() > Operator::Power.precedence());
        assert!(Operator::Power.precedence() > Operator::Divide.precedence());
        assert_eq!(Operator::Multiply.precedence(), Operator::Divide.precedence());
        assert!(Operator::Multiply.precedence() > Operator::Subtract.precedence());
    }

    #[test]
    #[should_panic(expected = "takes 2 operands")]
    fn operator_rejects_wrong_arity() {
        Node::operator(Operator::Add, vec![constant(1.0, 0.0)]);
    }

    #[test]
    fn non_commutative_operands_keep_source_order() {
        let sub = Node::operator(Operator::Subtract, vec![constant(5.0, 0.0), constant(2.0, 0.0)]);
        assert_eq!(sub.compute(&NoVariables), Ok(Complex::new(3.0, 0.0)));

        let div = Node::operator(Operator::Divide, vec![constant(1.0, 0.0), constant(4.0, 0.0)]);
        assert_eq!(div.compute(&NoVariables), Ok(Complex::new(0.25, 0.0)));

        let pow = Node::operator(Operator::Power, vec![constant(2.0, 0.0), constant(3.0, 0.0)]);
        assert_eq!(pow.compute(&NoVariables), Ok(Complex::new(8.0, 0.0)));
    }

    #[test]
    fn undefined_variable() {
        let node = Node::operator(Operator::Add, vec![variable("z"), variable("w")]);
        let context = [("z", Complex::ONE), ("c", Complex::I)];
        assert_eq!(
            node.compute(&context),
            Err(EvalError::UndefinedVariable("w".to_owned()))
        );
    }

    #[test]
    fn contexts_agree() {
        let node = Node::operator(Operator::Multiply, vec![variable("z"), variable("c")]);
        let z = Complex::new(1.0, 2.0);
        let c = Complex::new(-0.5, 0.25);

        let array = [("z", z), ("c", c)];
        let slice: &[(&str, Complex)] = &[("c", c), ("z", z), ("z", Complex::ONE)];

        let expected = Ok(z * c);
        assert_eq!(node.compute(&array), expected);
        // First binding wins.
        assert_eq!(node.compute(slice), expected);
    }

    #[test]
    fn reduce_folds_constant_subtrees_only() {
        // z + (2 * 3)
        let node = Node::operator(
            Operator::Add,
            vec![
                variable("z"),
                Node::operator(Operator::Multiply, vec![constant(2.0, 0.0), constant(3.0, 0.0)]),
            ],
        );
        let reduced = node.reduce().unwrap();
        assert_eq!(
            reduced,
            Node::operator(Operator::Add, vec![variable("z"), constant(6.0, 0.0)])
        );
        assert_eq!(reduced.reduce().unwrap(), reduced);
    }

    #[test]
    fn reduce_reports_folding_errors() {
        let node = Node::operator(Operator::Divide, vec![constant(1.0, 0.0), constant(0.0, 0.0)]);
        assert_eq!(
            node.reduce(),
            Err(EvalError::Arithmetic(ArithmeticError::DivideByZero))
        );
    }

    #[test]
    fn pretty_print() {
        let node = Node::operator(
            Operator::Add,
            vec![
                Node::operator(Operator::Power, vec![variable("z"), constant(2.0, 0.0)]),
                variable("c"),
            ],
        );
        let expected = "\
└── +
    ├── ^
    │   ├── z
    │   └── 2 + 0i
    └── c
";
        assert_eq!(node.pretty(), expected);
    }
}

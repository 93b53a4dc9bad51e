//! Formula parsing with a two-stack variant of the shunting-yard algorithm.
//!
//! Operators wait on one stack, finished subtrees on the other. Whenever an
//! operator arrives, every stacked operator that binds at least as tightly
//! is popped and combined with its operands into a new subtree.

use crate::{
    complex::Complex,
    error::SyntaxError,
    formula::{Node, Operator},
};

/// Characters that end a token and form a token of their own.
const DELIMITERS: &[char] = &['+', '-', '*', '/', '^', '!', '(', ')'];

/// Deepest tree the parser builds, counting leaves as one level.
///
/// Evaluation, folding and dropping all recurse once per level, and
/// evaluation runs on render threads with default-sized stacks.
pub const MAX_DEPTH: usize = 256;

/// A finished subtree waiting on the operand stack.
struct Subtree {
    node: Node,
    depth: usize,
}

impl Subtree {
    fn leaf(node: Node) -> Self {
        Subtree { node, depth: 1 }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pending {
    Open,
    Op(Operator),
}

/// What the previous token was; decides whether `-` is unary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Previous {
    Start,
    Operand,
    Open,
    Close,
    Op(Operator),
}

/// Splits formula text into tokens.
///
/// Whitespace separates tokens and is dropped; operators and parentheses
/// are tokens on their own.
fn tokenize(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        let is_delimiter = DELIMITERS.contains(&ch);
        if ch.is_whitespace() || is_delimiter {
            if start < idx {
                tokens.push(&input[start..idx]);
            }
            if is_delimiter {
                tokens.push(&input[idx..idx + ch.len_utf8()]);
            }
            start = idx + ch.len_utf8();
        }
    }
    if start < input.len() {
        tokens.push(&input[start..]);
    }
    tokens
}

/// `-` subtracts after an operand, a closing parenthesis, or an operator
/// binding at least as tightly as negation; otherwise it negates.
fn minus(previous: Previous) -> Operator {
    match previous {
        Previous::Operand | Previous::Close => Operator::Subtract,
        Previous::Op(op) if op.precedence() >= Operator::Negate.precedence() => {
            Operator::Subtract
        }
        Previous::Start | Previous::Open | Previous::Op(_) => Operator::Negate,
    }
}

fn operand(token: &str) -> Result<Node, SyntaxError> {
    match token {
        "i" => Ok(Node::Constant(Complex::I)),
        "e" => Ok(Node::Constant(Complex::E)),
        _ if token.chars().all(|c| c.is_ascii_alphabetic()) => {
            Ok(Node::Variable(token.to_owned()))
        }
        _ => token
            .parse::<f64>()
            .map(|re| Node::Constant(Complex::new(re, 0.0)))
            .map_err(|_| SyntaxError::UnrecognizedToken(token.to_owned())),
    }
}

/// Pops the top operator and its operands, pushing the combined subtree.
fn fold(op: Operator, operands: &mut Vec<Subtree>) -> Result<(), SyntaxError> {
    let arity = op.arity();
    if operands.len() < arity {
        return Err(SyntaxError::MissingOperands);
    }
    let args = operands.split_off(operands.len() - arity);
    let depth = 1 + args.iter().map(|arg| arg.depth).max().unwrap_or(0);
    if depth > MAX_DEPTH {
        return Err(SyntaxError::TooDeep(MAX_DEPTH));
    }
    let node = Node::operator(op, args.into_iter().map(|arg| arg.node).collect());
    operands.push(Subtree { node, depth });
    Ok(())
}

/// Folds stacked operators binding at least as tightly as `precedence`,
/// stopping at an open parenthesis.
fn unstack(
    operators: &mut Vec<Pending>,
    operands: &mut Vec<Subtree>,
    precedence: u8,
) -> Result<(), SyntaxError> {
    while let Some(&Pending::Op(op)) = operators.last() {
        if op.precedence() < precedence {
            break;
        }
        operators.pop();
        fold(op, operands)?;
    }
    Ok(())
}

/// Parses formula text into a syntax tree.
///
/// `e` and `i` are constants, other alphabetic tokens are variables and
/// numbers are real literals. Trees deeper than [MAX_DEPTH] are rejected.
pub fn parse(input: &str) -> Result<Node, SyntaxError> {
    let mut operators: Vec<Pending> = Vec::new();
    let mut operands: Vec<Subtree> = Vec::new();
    let mut previous = Previous::Start;

    for token in tokenize(input) {
        let op = match token {
            "(" => {
                operators.push(Pending::Open);
                previous = Previous::Open;
                continue;
            }
            ")" => {
                unstack(&mut operators, &mut operands, 0)?;
                if operators.pop() != Some(Pending::Open) {
                    return Err(SyntaxError::UnmatchedParenthesis);
                }
                previous = Previous::Close;
                continue;
            }
            "+" => Operator::Add,
            "-" => minus(previous),
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            "^" => Operator::Power,
            "!" => Operator::Factorial,
            _ => {
                operands.push(Subtree::leaf(operand(token)?));
                previous = Previous::Operand;
                continue;
            }
        };
        unstack(&mut operators, &mut operands, op.precedence())?;
        operators.push(Pending::Op(op));
        previous = Previous::Op(op);
    }

    while let Some(pending) = operators.pop() {
        match pending {
            Pending::Op(op) => fold(op, &mut operands)?,
            Pending::Open => return Err(SyntaxError::UnmatchedParenthesis),
        }
    }

    let root = operands.pop().ok_or(SyntaxError::Empty)?.node;
    if !operands.is_empty() {
        return Err(SyntaxError::UnmatchedOperands);
    }
    tracing::trace!("parsed formula {:?}:\n{}", input, root.pretty());
    Ok(root)
}

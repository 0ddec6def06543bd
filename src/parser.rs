//! Compiles a find-style token list into an [`Expr`].
//!
//! Tokens are either operators (`-and`/`-a`, `-or`/`-o`, `-not`/`!`) or a
//! predicate keyword followed by its argument, if it takes one. Adjacent
//! predicates are joined by an implicit `-and`. `-not` binds tightest and is
//! right associative; `-and` binds tighter than `-or`, both left associative.
//!
//! Operators are reordered into postfix form with a shunting-yard pass, then
//! the tree is rebuilt from the postfix sequence with a single operand stack.

use std::fmt::{self, Display};

use crate::expr::Expr;
use crate::parse_error::{Malformed, ParseError};
use crate::predicate::{Predicate, PredicateKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    And,
    Not,
}

impl Operator {
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Or => 1,
            Operator::And => 2,
            Operator::Not => 3,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Operator::Or => "-or",
            Operator::And => "-and",
            Operator::Not => "-not",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "-and" | "-a" => Some(Operator::And),
            "-or" | "-o" => Some(Operator::Or),
            "-not" | "!" => Some(Operator::Not),
            _ => None,
        }
    }

    fn is_unary(&self) -> bool {
        matches!(self, Operator::Not)
    }

    /// Whether `self`, sitting on the operator stack, is emitted before
    /// `incoming` is pushed
    fn yields_to(&self, incoming: Operator) -> bool {
        if incoming.is_unary() {
            self.precedence() > incoming.precedence()
        } else {
            self.precedence() >= incoming.precedence()
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug)]
enum Postfix {
    Leaf(Predicate),
    /// operator and the token position it came from
    Operator(Operator, usize),
}

/// Upper bound on operators plus predicates in one expression. Evaluation,
/// display and drop all recurse once per tree level, so this also bounds
/// their stack depth.
pub const MAX_NODES: usize = 1024;

/// Parse state scoped to a single compile
#[derive(Debug, Default)]
struct Compiler {
    output: Vec<Postfix>,
    operators: Vec<(Operator, usize)>,
    last_was_leaf: bool,
}

impl Compiler {
    /// Operators move from the operator stack to the output, never in
    /// the other direction, so the sum of both is the node count.
    fn reserve(&self, position: usize) -> Result<(), ParseError> {
        if self.output.len() + self.operators.len() >= MAX_NODES {
            return Err(ParseError::malformed(Malformed::TooLarge(MAX_NODES), position));
        }
        Ok(())
    }

    fn push_operator(&mut self, op: Operator, position: usize) -> Result<(), ParseError> {
        self.reserve(position)?;
        while let Some(&(top, top_position)) = self.operators.last() {
            if !top.yields_to(op) {
                break;
            }
            self.operators.pop();
            self.output.push(Postfix::Operator(top, top_position));
        }
        self.operators.push((op, position));
        self.last_was_leaf = false;
        Ok(())
    }

    fn push_leaf(&mut self, predicate: Predicate, position: usize) -> Result<(), ParseError> {
        if self.last_was_leaf {
            self.push_operator(Operator::And, position)?;
        }
        self.reserve(position)?;
        self.output.push(Postfix::Leaf(predicate));
        self.last_was_leaf = true;
        Ok(())
    }

    fn finish(mut self, end: usize) -> Result<Expr, ParseError> {
        // a trailing operator never received its right-hand operand
        if !self.last_was_leaf {
            if let Some(&(op, position)) = self.operators.last() {
                return Err(ParseError::malformed(Malformed::MissingOperand(op), position));
            }
        }

        while let Some((op, position)) = self.operators.pop() {
            self.output.push(Postfix::Operator(op, position));
        }
        resolve(self.output, end)
    }
}

/// Rebuild the tree from postfix form. For binary operators the most
/// recently pushed operand is the right child.
fn resolve(postfix: Vec<Postfix>, end: usize) -> Result<Expr, ParseError> {
    let mut operands: Vec<Expr> = Vec::with_capacity(postfix.len());

    for item in postfix {
        match item {
            Postfix::Leaf(p) => operands.push(Expr::leaf(p)),
            Postfix::Operator(op, position) => {
                let missing = || ParseError::malformed(Malformed::MissingOperand(op), position);
                let node = match op {
                    Operator::Not => Expr::not(operands.pop().ok_or_else(missing)?),
                    Operator::And | Operator::Or => {
                        let right = operands.pop().ok_or_else(missing)?;
                        let left = operands.pop().ok_or_else(missing)?;
                        if op == Operator::And {
                            Expr::and(left, right)
                        } else {
                            Expr::or(left, right)
                        }
                    }
                };
                operands.push(node);
            }
        }
    }

    match operands.len() {
        0 => Err(ParseError::malformed(Malformed::Empty, end)),
        1 => Ok(operands.remove(0)),
        n => Err(ParseError::malformed(Malformed::ExcessOperands(n), end)),
    }
}

/// Compile a token list into an expression tree.
///
/// Fails on the first unknown keyword, on a keyword whose argument is
/// missing, or when the operators and operands do not form a single tree.
/// No partial tree is ever returned.
pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Expr, ParseError> {
    let mut compiler = Compiler::default();
    let mut position = 0;

    while position < tokens.len() {
        let token = tokens[position].as_ref();

        if let Some(op) = Operator::from_token(token) {
            // `a -not b` reads as `a -and -not b`
            if op.is_unary() && compiler.last_was_leaf {
                compiler.push_operator(Operator::And, position)?;
            }
            compiler.push_operator(op, position)?;
            position += 1;
            continue;
        }

        let kind: PredicateKind = token
            .parse()
            .map_err(|e| ParseError::from_predicate(e, position))?;

        let argument = if kind.takes_argument() {
            tokens.get(position + 1).map(AsRef::as_ref)
        } else {
            None
        };

        let predicate = Predicate::compile(kind, argument)
            .map_err(|e| ParseError::from_predicate(e, position + 1))?;

        compiler.push_leaf(predicate, position)?;
        position += if kind.takes_argument() { 2 } else { 1 };
    }

    compiler.finish(tokens.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(keyword: &str, arg: Option<&str>) -> Expr {
        Expr::leaf(Predicate::parse(keyword, arg).unwrap())
    }

    #[test]
    fn single_predicate() {
        assert_eq!(parse(&["-empty"]).unwrap(), leaf("-empty", None));
        assert_eq!(parse(&["-size", "+3"]).unwrap(), leaf("-size", Some("+3")));
    }

    #[test]
    fn implicit_and_matches_explicit() {
        let implicit = parse(&["-type", "f", "-size", "+100"]).unwrap();
        let explicit = parse(&["-type", "f", "-and", "-size", "+100"]).unwrap();
        let short = parse(&["-type", "f", "-a", "-size", "+100"]).unwrap();
        let expected = Expr::and(leaf("-type", Some("f")), leaf("-size", Some("+100")));
        assert_eq!(implicit, expected);
        assert_eq!(explicit, expected);
        assert_eq!(short, expected);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let e = parse(&["-true", "-or", "-false", "-and", "-empty"]).unwrap();
        assert_eq!(
            e,
            Expr::or(
                leaf("-true", None),
                Expr::and(leaf("-false", None), leaf("-empty", None))
            )
        );

        let e = parse(&["-true", "-and", "-false", "-o", "-empty"]).unwrap();
        assert_eq!(
            e,
            Expr::or(
                Expr::and(leaf("-true", None), leaf("-false", None)),
                leaf("-empty", None)
            )
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let e = parse(&["-true", "-o", "-false", "-o", "-empty"]).unwrap();
        assert_eq!(
            e,
            Expr::or(
                Expr::or(leaf("-true", None), leaf("-false", None)),
                leaf("-empty", None)
            )
        );

        let e = parse(&["-true", "-false", "-empty"]).unwrap();
        assert_eq!(
            e,
            Expr::and(
                Expr::and(leaf("-true", None), leaf("-false", None)),
                leaf("-empty", None)
            )
        );
    }

    #[test]
    fn not_binds_tightest() {
        let e = parse(&["-not", "-true", "-and", "-false"]).unwrap();
        assert_eq!(
            e,
            Expr::and(Expr::not(leaf("-true", None)), leaf("-false", None))
        );

        let e = parse(&["-true", "-or", "!", "-false", "-empty"]).unwrap();
        assert_eq!(
            e,
            Expr::or(
                leaf("-true", None),
                Expr::and(Expr::not(leaf("-false", None)), leaf("-empty", None))
            )
        );
    }

    #[test]
    fn not_is_right_associative() {
        let e = parse(&["!", "-not", "-empty"]).unwrap();
        assert_eq!(e, Expr::not(Expr::not(leaf("-empty", None))));
    }

    #[test]
    fn not_after_predicate_is_implicitly_conjoined() {
        let e = parse(&["-type", "f", "!", "-empty"]).unwrap();
        assert_eq!(
            e,
            Expr::and(leaf("-type", Some("f")), Expr::not(leaf("-empty", None)))
        );
    }

    #[test]
    fn unknown_predicate() {
        let err = parse(&["-type", "f", "-frobnicate"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownPredicate {
                keyword: "-frobnicate".to_owned(),
                position: 2
            }
        );
    }

    #[test]
    fn missing_argument() {
        let err = parse(&["-empty", "-name"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingArgument {
                keyword: "-name",
                position: 2
            }
        );
    }

    #[test]
    fn predicate_argument_may_look_like_operator() {
        let e = parse(&["-name", "-o"]).unwrap();
        assert_eq!(e, leaf("-name", Some("-o")));
    }

    #[test]
    fn malformed_expressions() {
        let empty: [&str; 0] = [];
        assert_eq!(
            parse(&empty).unwrap_err(),
            ParseError::MalformedExpression {
                kind: Malformed::Empty,
                position: 0
            }
        );

        assert_eq!(
            parse(&["-true", "-or"]).unwrap_err(),
            ParseError::MalformedExpression {
                kind: Malformed::MissingOperand(Operator::Or),
                position: 1
            }
        );

        assert_eq!(
            parse(&["-and", "-true"]).unwrap_err(),
            ParseError::MalformedExpression {
                kind: Malformed::MissingOperand(Operator::And),
                position: 0
            }
        );

        assert_eq!(
            parse(&["-true", "-not"]).unwrap_err(),
            ParseError::MalformedExpression {
                kind: Malformed::MissingOperand(Operator::Not),
                position: 1
            }
        );

        assert!(matches!(
            parse(&["-true", "-and", "-or", "-false"]),
            Err(ParseError::MalformedExpression { .. })
        ));
    }
}

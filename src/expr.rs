use std::fmt::{self, Display, Write};

use crate::parser::Operator;
use crate::predicate::Predicate;

/// Compiled filesystem entry matcher: predicates combined with boolean logic.
/// Each node owns its children; the tree is never mutated after compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Leaf(Predicate),
    Not(Box<Self>),
    /// left is evaluated first
    And(Box<Self>, Box<Self>),
    Or(Box<Self>, Box<Self>),
}

impl Expr {
    pub fn leaf(p: Predicate) -> Self {
        Self::Leaf(p)
    }
    pub fn and(a: Self, b: Self) -> Self {
        Self::And(Box::new(a), Box::new(b))
    }
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }
    #[allow(clippy::should_implement_trait)]
    pub fn not(a: Self) -> Self {
        Self::Not(Box::new(a))
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Expr::Leaf(_) => None,
            Expr::Not(_) => Some(Operator::Not),
            Expr::And(_, _) => Some(Operator::And),
            Expr::Or(_, _) => Some(Operator::Or),
        }
    }

    /// Pre-order listing, one node per line, children indented four spaces
    /// deeper than their parent. Each line names the node and its tag.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let (label, tag) = match self {
            Expr::Leaf(p) => (p.kind().keyword(), p.kind().tag()),
            Expr::Not(_) => (Operator::Not.keyword(), Operator::Not.precedence()),
            Expr::And(_, _) => (Operator::And.keyword(), Operator::And.precedence()),
            Expr::Or(_, _) => (Operator::Or.keyword(), Operator::Or.precedence()),
        };
        // writing to a String cannot fail
        let _ = writeln!(out, "{:indent$}{} [{:02x}]", "", label, tag, indent = indent);

        match self {
            Expr::Leaf(_) => {}
            Expr::Not(x) => x.dump_into(out, indent + 4),
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.dump_into(out, indent + 4);
                b.dump_into(out, indent + 4);
            }
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(p) => write!(f, "{}", p),
            Self::Not(a) => match **a {
                Self::Leaf(_) | Self::Not(_) => write!(f, "-not {}", a),
                _ => write!(f, "-not ( {} )", a),
            },
            Self::And(a, b) => write!(f, "( {} -and {} )", a, b),
            Self::Or(a, b) => write!(f, "( {} -or {} )", a, b),
        }
    }
}

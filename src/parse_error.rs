//! Compile errors for predicate expressions, plus a miette diagnostic that
//! points at the offending token in the argument list as given.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::parser::Operator;
use crate::predicate_error::PredicateParseError;

/// Every position is an index into the token list handed to the compiler.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized predicate `{keyword}'")]
    #[diagnostic(code(tally::unknown_predicate), help(
        "known predicates: -maxdepth -mindepth -amin -atime -anewer -cmin -ctime -cnewer \
         -mmin -mtime -mnewer -empty -true -false -type -xtype -gid -group -uid -user \
         -lname -ilname -name -iname -path -ipath -inum -links -readable -writable \
         -samefile -size"
    ))]
    UnknownPredicate { keyword: String, position: usize },

    #[error("{keyword} requires a value")]
    #[diagnostic(code(tally::missing_argument))]
    MissingArgument {
        keyword: &'static str,
        position: usize,
    },

    #[error("malformed expression: {kind}")]
    #[diagnostic(code(tally::malformed_expression))]
    MalformedExpression { kind: Malformed, position: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Malformed {
    #[error("empty expression")]
    Empty,

    #[error("{0} is missing an operand")]
    MissingOperand(Operator),

    #[error("{0} operands are not joined by an operator")]
    ExcessOperands(usize),

    #[error("more than {0} operators and predicates")]
    TooLarge(usize),
}

impl ParseError {
    pub(crate) fn from_predicate(err: PredicateParseError, position: usize) -> Self {
        match err {
            PredicateParseError::UnknownKeyword(keyword) => {
                ParseError::UnknownPredicate { keyword, position }
            }
            PredicateParseError::MissingArgument(keyword) => {
                ParseError::MissingArgument { keyword, position }
            }
        }
    }

    pub(crate) fn malformed(kind: Malformed, position: usize) -> Self {
        ParseError::MalformedExpression { kind, position }
    }

    pub fn position(&self) -> usize {
        match self {
            ParseError::UnknownPredicate { position, .. }
            | ParseError::MissingArgument { position, .. }
            | ParseError::MalformedExpression { position, .. } => *position,
        }
    }

    /// Attach the token list so the error renders with the offending token underlined
    pub fn with_source<S: AsRef<str>>(self, tokens: &[S]) -> ExpressionDiagnostic {
        let mut src = String::new();
        let mut span = None;
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                src.push(' ');
            }
            if i == self.position() {
                span = Some((src.len(), token.as_ref().len()).into());
            }
            src.push_str(token.as_ref());
        }

        // positions past the end point just after the last token
        let span = span.unwrap_or_else(|| (src.len(), 0).into());

        ExpressionDiagnostic {
            src: NamedSource::new("expression", src),
            span,
            error: self,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("{error}")]
pub struct ExpressionDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label(primary, "here")]
    span: SourceSpan,

    #[diagnostic_source]
    error: ParseError,
}

impl ExpressionDiagnostic {
    pub fn error(&self) -> &ParseError {
        &self.error
    }
}

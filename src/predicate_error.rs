use thiserror::Error;

/// Error type for compiling a single predicate keyword and its argument
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredicateParseError {
    #[error("unrecognized predicate `{0}'")]
    UnknownKeyword(String),

    #[error("{0} requires a value")]
    MissingArgument(&'static str),
}

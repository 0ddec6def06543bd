use thiserror::Error;

use crate::parse_error::ParseError;
use crate::walk::WalkError;

/// Structured error type for tally operations
#[derive(Debug, Error)]
pub enum TallyError {
    /// The expression did not compile; nothing was walked
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Walk(#[from] WalkError),
}

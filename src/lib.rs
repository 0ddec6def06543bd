//! Count and measure filesystem entries selected by a find-style
//! predicate expression.
//!
//! A token list such as `["-type", "f", "-size", "+100"]` is compiled once
//! into an [`Expr`], evaluated against every entry of a directory walk, and
//! each match is recorded into [`Stats`].

pub mod aggregate;
pub mod entry;
mod error;
pub mod eval;
pub mod expr;
pub mod output;
pub mod owner;
pub mod parse_error;
pub mod parser;
pub mod predicate;
mod predicate_error;
pub mod walk;

use std::path::Path;

use slog::{debug, Logger};

pub use aggregate::{Aggregate, Reading, Stats, Track};
pub use entry::{Entry, FileKind, StatSnapshot};
pub use error::TallyError;
pub use expr::Expr;
pub use parse_error::ParseError;
pub use parser::parse;
pub use predicate::{Arg, CompareMode, Predicate, PredicateKind};
pub use predicate_error::PredicateParseError;

/// Compile `tokens`, walk `root`, and record every match into `stats`.
/// Compile errors are returned before anything is walked.
pub fn parse_and_tally<S: AsRef<str>>(
    logger: &Logger,
    root: &Path,
    tokens: &[S],
    stats: &mut Stats,
) -> Result<(), TallyError> {
    let e = parse(tokens)?;
    debug!(logger, "compiled expression"; "expr" => %e);
    tally(logger, root, &e, stats)
}

/// Walk `root` with an already compiled expression
pub fn tally(logger: &Logger, root: &Path, e: &Expr, stats: &mut Stats) -> Result<(), TallyError> {
    let visited = walk::run(logger, root, e, |entry| {
        debug!(logger, "found file"; "path" => %entry.path.display(), "size" => entry.stat.size);
        stats.record(entry);
    })?;

    debug!(logger, "filesystem traversal complete";
        "visited" => visited,
        "count" => stats.count,
        "min" => stats.min,
        "max" => stats.max,
        "sum" => stats.sum,
        "avg" => stats.average()
    );

    Ok(())
}

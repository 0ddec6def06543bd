use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use slog::{o, warn, Drain, Level, LevelFilter, Logger};
use tally::output::{safe_stdout, Sample};
use tally::{Aggregate, Stats, Track};

/// Count or measure the files under a directory that match a find-style
/// expression, and print the result as a metric sample
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// directory to walk
    path: PathBuf,

    /// what to measure for each match: count or size
    #[arg(long, default_value = "count")]
    track: Track,

    /// how to combine sizes: sum, min, max or avg
    #[arg(long, visible_alias = "aggr", default_value = "sum")]
    aggregate: Aggregate,

    /// log every match and the final stats to stderr
    #[arg(long)]
    debug: bool,

    /// print the compiled expression tree to stderr before walking
    #[arg(long)]
    dump_tree: bool,

    /// metric prefix, defaults to the host name
    #[arg(long)]
    prefix: Option<String>,

    /// metric name
    #[arg(long, default_value = "files")]
    name: String,

    /// predicate expression, e.g. `-type f -size +100`
    #[arg(last = true, required = true, allow_hyphen_values = true)]
    expr: Vec<String>,
}

fn logger(debug: bool) -> Logger {
    let plain = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(plain).build().fuse();
    let level = if debug { Level::Debug } else { Level::Info };
    Logger::root(LevelFilter::new(drain, level).fuse(), o!())
}

pub fn main() -> ExitCode {
    let args = Args::parse();
    let logger = logger(args.debug);

    let e = match tally::parse(args.expr.as_slice()) {
        Ok(e) => e,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err.with_source(args.expr.as_slice())));
            return ExitCode::FAILURE;
        }
    };

    if args.dump_tree {
        eprintln!("\neval parse tree:\n{}", e.dump());
    }

    match run(&logger, &args, &e) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tally: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(logger: &Logger, args: &Args, e: &tally::Expr) -> anyhow::Result<()> {
    let mut aggregate = args.aggregate;
    if args.track == Track::Count && aggregate != Aggregate::Sum {
        warn!(logger, "-track count with a non-sum aggregate makes no sense, falling back to sum";
            "aggregate" => %aggregate);
        aggregate = Aggregate::Sum;
    }

    let mut stats = Stats::new(args.track, aggregate);
    tally::tally(logger, &args.path, e, &mut stats)?;

    let prefix = match &args.prefix {
        Some(prefix) => prefix.clone(),
        None => gethostname::gethostname().to_string_lossy().into_owned(),
    };

    let sample = Sample {
        timestamp: chrono::Utc::now().timestamp(),
        prefix: &prefix,
        name: &args.name,
        reading: stats.finalize(),
    };

    safe_stdout()
        .writeln(sample)
        .context("failed to write sample")?;

    Ok(())
}

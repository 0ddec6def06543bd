use std::fmt::{self, Display};
use std::io::{self, Write};

use crate::aggregate::Reading;

/// One metric line: `SAMPLE <ts> <prefix>:<name> <value>`
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub timestamp: i64,
    pub prefix: &'a str,
    pub name: &'a str,
    pub reading: Reading,
}

impl Display for Sample<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SAMPLE {} {}:{} {}",
            self.timestamp, self.prefix, self.name, self.reading
        )
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Integer(n) => write!(f, "{}", n),
            Reading::Float(x) => f.write_str(&scientific(*x)),
            // rrd convention for an unknown value
            Reading::NoData => f.write_str("U"),
        }
    }
}

/// printf `%e`: six fractional digits, signed exponent of at least two digits
fn scientific(x: f64) -> String {
    let formatted = format!("{:.6e}", x);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => format!(
                "{}e{}{:02}",
                mantissa,
                if exp < 0 { '-' } else { '+' },
                exp.unsigned_abs()
            ),
            Err(_) => formatted,
        },
        // inf / NaN
        None => formatted,
    }
}

/// Safe output writer that handles BrokenPipe errors gracefully
/// Follows Unix convention: exit code 0 on SIGPIPE/BrokenPipe
pub struct SafeOutput<W: Write> {
    writer: W,
}

impl<W: Write> SafeOutput<W> {
    pub fn new(writer: W) -> Self {
        SafeOutput { writer }
    }

    /// Write a line, exiting the process with code 0 if the reader went away
    pub fn writeln(&mut self, content: impl Display) -> io::Result<()> {
        let res = writeln!(self.writer, "{}", content).and_then(|_| self.writer.flush());
        match res {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => std::process::exit(0),
            other => other,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Convenience function for creating SafeOutput with stdout
pub fn safe_stdout() -> SafeOutput<io::Stdout> {
    SafeOutput::new(io::stdout())
}

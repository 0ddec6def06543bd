use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

use crate::entry::Entry;

/// What is measured for each matching entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Track {
    #[default]
    Count,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {what} `{found}', expected one of: {expected}")]
pub struct InvalidChoice {
    what: &'static str,
    found: String,
    expected: &'static str,
}

impl FromStr for Track {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(Track::Count),
            "size" => Ok(Track::Size),
            _ => Err(InvalidChoice {
                what: "track mode",
                found: s.to_owned(),
                expected: "count, size",
            }),
        }
    }
}

impl FromStr for Aggregate {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregate::Sum),
            "min" | "minimum" => Ok(Aggregate::Min),
            "max" | "maximum" => Ok(Aggregate::Max),
            "avg" | "average" => Ok(Aggregate::Avg),
            _ => Err(InvalidChoice {
                what: "aggregate",
                found: s.to_owned(),
                expected: "sum, min, max, avg",
            }),
        }
    }
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Aggregate::Sum => "sum",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Avg => "avg",
        })
    }
}

/// Final value of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Integer(u64),
    Float(f64),
    /// min, max or avg over zero matches
    NoData,
}

/// Running totals over matching entries. `min` and `max` only carry
/// meaning once `count` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stats {
    pub track: Track,
    pub aggregate: Aggregate,
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub sum: u64,
}

impl Stats {
    pub fn new(track: Track, aggregate: Aggregate) -> Self {
        Self {
            track,
            aggregate,
            ..Default::default()
        }
    }

    /// Record one matching entry
    pub fn record(&mut self, entry: &Entry) {
        self.record_size(entry.stat.size)
    }

    pub fn record_size(&mut self, size: u64) {
        self.count += 1;
        if self.track != Track::Size {
            return;
        }
        if self.count == 1 {
            self.min = size;
            self.max = size;
        } else {
            self.min = self.min.min(size);
            self.max = self.max.max(size);
        }
        self.sum = self.sum.saturating_add(size);
    }

    /// Count mode always reports the number of matches
    pub fn finalize(&self) -> Reading {
        match (self.track, self.aggregate) {
            (Track::Count, _) => Reading::Integer(self.count),
            (Track::Size, Aggregate::Sum) => Reading::Integer(self.sum),
            (Track::Size, _) if self.count == 0 => Reading::NoData,
            (Track::Size, Aggregate::Min) => Reading::Integer(self.min),
            (Track::Size, Aggregate::Max) => Reading::Integer(self.max),
            (Track::Size, Aggregate::Avg) => self.average().map_or(Reading::NoData, Reading::Float),
        }
    }

    /// Mean size of the matches, `None` before the first one
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

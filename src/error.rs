use std::path::PathBuf;

use thiserror::Error;

pub type ExploreResult<T> = Result<T, ExploreError>;

#[derive(Debug, Error)]
pub enum ExploreError {
    /// No token of the input survived validation.
    #[error("no valid {kind} in {raw:?} (expected {expected})")]
    InvalidSelector {
        kind: &'static str,
        raw: String,
        expected: String,
    },

    /// A record the loader could not use: bad start time or invalid UTF-8.
    /// Recovered by skipping the record.
    #[error("line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("no data available for {0}")]
    EmptyAggregationInput(&'static str),

    #[error("unknown city {0:?} (expected chicago, new york city or washington)")]
    UnknownCity(String),

    #[error("trip data has no {0:?} column")]
    MissingColumn(&'static str),

    #[error("failed to read trip data from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

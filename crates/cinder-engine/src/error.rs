//! Engine-side error types.

use std::collections::TryReserveError;

/// Errors from (re)allocating the transposition table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TtError {
    /// The backing store could not be reserved. The table is left empty and must
    /// not be searched with.
    #[error("cannot allocate {clusters} clusters ({bytes} bytes) for the transposition table")]
    Alloc {
        clusters: usize,
        bytes: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Errors from setting an engine option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("option {name}: value {value} outside [{min}, {max}]")]
    OutOfBounds { name: &'static str, value: i64, min: i64, max: i64 },
    #[error("option {name}: \"{found}\" is not an integer")]
    NotANumber { name: &'static str, found: String },
}

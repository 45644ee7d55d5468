//! The [`VarsetsError`] `enum` definition and error messages.
//!
//! Errors fall into four groups: configuration errors (raised before any
//! record is clustered), schema errors (a record that cannot be placed on
//! the genome), internal invariant violations (always fatal) and the usual
//! I/O and parsing errors.
//!
use genomap::GenomeMapError;
use std::num::ParseIntError;
use thiserror::Error;

/// The [`VarsetsError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum VarsetsError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("TSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("BED file line has too few columns; the first three columns must be sequence name, start and end.\nLine: {0}")]
    BedTooFewColumns(String),

    // Configuration errors
    #[error("Configuration error: max_neighbor_distance must be non-negative (got {0})")]
    NegativeDistance(i64),
    #[error("Configuration error: max_neighbor_distance {0} exceeds the indexable coordinate range")]
    DistanceTooLarge(i64),
    #[error("Configuration error: the number of threads must be at least 1 (got {0})")]
    InvalidThreadCount(usize),
    #[error("Configuration error: {0} must be within [0, 1] (got {1})")]
    ThresholdOutOfRange(&'static str, f64),
    #[error("Configuration error: {0} is set but match_variant_types is false")]
    ContradictoryCriteria(&'static str),
    #[error("Configuration error: min_collections must be between 1 and {1} (got {0})")]
    InvalidMinimumCollections(usize, usize),
    #[error("Configuration error: operation '{0}' requires at least {1} input collection(s), got {2}")]
    TooFewCollections(&'static str, usize, usize),
    #[error("Configuration error: invalid filter on '{0}': {1}")]
    InvalidFilter(String, String),
    #[error("Configuration error: both num_threads ({0}) and num_processes ({1}) were given and disagree")]
    ConflictingThreadCounts(usize, usize),
    #[error("Could not build worker pool: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    // Schema errors
    #[error("Schema error in collection '{collection}', record '{record}': field '{field}' is missing")]
    MissingField {
        collection: String,
        record: String,
        field: &'static str,
    },
    #[error("Schema error in collection '{collection}', record '{record}': field '{field}' is invalid ({reason})")]
    InvalidField {
        collection: String,
        record: String,
        field: &'static str,
        reason: String,
    },
    #[error("Range invalid: start ({0}) must not be greater than end ({1})")]
    InvalidGenomicRange(i64, i64),

    // Internal invariant violations
    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),
    #[error("Error encountered in genomap::GenomeMap")]
    GenomeMapError(#[from] GenomeMapError),
}

impl VarsetsError {
    /// Whether this error was caused by invalid configuration, detected
    /// before any clustering was attempted.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            VarsetsError::NegativeDistance(_)
                | VarsetsError::DistanceTooLarge(_)
                | VarsetsError::InvalidThreadCount(_)
                | VarsetsError::ThresholdOutOfRange(..)
                | VarsetsError::ContradictoryCriteria(_)
                | VarsetsError::InvalidMinimumCollections(..)
                | VarsetsError::TooFewCollections(..)
                | VarsetsError::InvalidFilter(..)
                | VarsetsError::ConflictingThreadCounts(..)
                | VarsetsError::JsonError(_)
        )
    }

    /// Whether this error was caused by a record missing required
    /// geometry or carrying an unusable value.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            VarsetsError::MissingField { .. }
                | VarsetsError::InvalidField { .. }
                | VarsetsError::InvalidGenomicRange(..)
        )
    }
}

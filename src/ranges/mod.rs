//! Range and Range Containers.
//!
//! All ranges here are 1-based and end-inclusive, matching variant call
//! positions. A breakpoint is stored as the single-position range
//! `[position, position]`.

use crate::{error::VarsetsError, traits::GenericRange, Position};

pub mod coitrees;
pub mod operations;
pub mod vec;

/// Validate a 1-based, end-inclusive range.
pub fn validate_range(start: Position, end: Position) -> Result<(), VarsetsError> {
    if start > end {
        return Err(VarsetsError::InvalidGenomicRange(start.into(), end.into()));
    }
    Ok(())
}

/// [`RangeIndexed`] is a range with an index to an element stored
/// elsewhere (a breakpoint handle or a position in a range list).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeIndexed {
    pub start: Position,
    pub end: Position,
    pub index: usize,
}

impl RangeIndexed {
    /// Create a new 1-based end-inclusive range.
    pub fn new(start: Position, end: Position, index: usize) -> Self {
        Self { start, end, index }
    }

    /// Create the single-position range of a breakpoint.
    pub fn point(position: Position, index: usize) -> Self {
        Self::new(position, position, index)
    }
}

impl GenericRange for RangeIndexed {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
    fn index(&self) -> Option<usize> {
        Some(self.index)
    }
}

/// A genomic range on a named chromosome, e.g. a target region for the
/// overlap operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenomicRange {
    pub chromosome: String,
    pub start: Position,
    pub end: Position,
}

impl GenomicRange {
    /// Create a new [`GenomicRange`], checking `start <= end`.
    pub fn try_new(
        chromosome: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Result<Self, VarsetsError> {
        validate_range(start, end)?;
        Ok(Self {
            chromosome: chromosome.into(),
            start,
            end,
        })
    }

    /// An identifier of the form `chromosome:start-end`.
    pub fn id(&self) -> String {
        format!("{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

impl GenericRange for GenomicRange {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
    fn index(&self) -> Option<usize> {
        None
    }
}

//! Range Operations.
//!
//! - [`pad()`]: widen a range by some number of basepairs on both sides.

use crate::Position;

use super::GenomicRange;

/// Widens a range by `padding` basepairs on each side. The start is clamped at
/// position 1 and the end at the largest representable position.
pub fn pad(range: &GenomicRange, padding: Position) -> GenomicRange {
    let start = range.start.saturating_sub(padding).max(1);
    let end = range.end.saturating_add(padding).min(crate::MAX_POSITION);
    GenomicRange {
        chromosome: range.chromosome.clone(),
        start: start.min(range.start),
        end: end.max(range.end),
    }
}

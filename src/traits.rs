//! Traits used by the varsets library.
//!

use crate::{variants::VariantCall, Position};

/// The [`GenericRange`] trait defines common functionality for all
/// 1-based, end-inclusive range types.
pub trait GenericRange: Clone {
    fn start(&self) -> Position;
    fn end(&self) -> Position;
    fn index(&self) -> Option<usize>;
    fn width(&self) -> Position {
        self.end() - self.start() + 1
    }
    /// Whether `position` falls within this range.
    fn contains(&self, position: Position) -> bool {
        self.start() <= position && position <= self.end()
    }
    /// Return a tuple version of this range.
    fn as_tuple(&self) -> (Position, Position, Option<usize>) {
        (self.start(), self.end(), self.index())
    }
}

/// Defines functionality common to all range containers, e.g. [`VecRanges<R>`] and
/// [`COITrees`].
///
/// [`VecRanges<R>`]: crate::ranges::vec::VecRanges
/// [`COITrees`]: crate::ranges::coitrees::COITrees
pub trait RangeContainer {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pairwise compatibility test between two variant calls.
///
/// Implementations must be symmetric: `matches(a, b) == matches(b, a)`.
/// The cluster builder only asks about pairs of distinct records whose
/// breakpoints lie within [`VariantMatcher::search_distance()`] of each other.
pub trait VariantMatcher: Sync {
    /// Whether the two calls represent the same event.
    fn matches(&self, a: &VariantCall, b: &VariantCall) -> bool;

    /// The largest breakpoint distance at which two calls could still
    /// match; used to bound neighbor queries.
    fn search_distance(&self) -> Position;
}

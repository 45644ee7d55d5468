use coitrees::{BasicCOITree, GenericInterval, IntervalNode, IntervalTree};

use crate::{traits::RangeContainer, Position};

use super::{vec::VecRanges, RangeIndexed};

pub type COITreesIndexed = COITrees<usize>;

/// Convert a position to a coitrees coordinate. Positions are validated to
/// fit in an `i32` when records enter the engine, so saturation only
/// applies to query windows that extend past the coordinate range.
pub(crate) fn to_coord(position: Position) -> i32 {
    i32::try_from(position).unwrap_or(i32::MAX)
}

impl GenericInterval<usize> for RangeIndexed {
    fn first(&self) -> i32 {
        to_coord(self.start)
    }
    fn last(&self) -> i32 {
        to_coord(self.end)
    }
    fn metadata(&self) -> &usize {
        &self.index
    }
}

/// A [`coitrees::BasicCOITree`] interval tree for a single chromosome's ranges.
pub struct COITrees<M: Clone> {
    pub(crate) ranges: BasicCOITree<M, usize>,
}

impl<M: Clone> std::fmt::Debug for COITrees<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("COITrees")
            .field("number of ranges:", &self.ranges.len())
            .finish()
    }
}

impl<M: Clone> COITrees<M> {
    /// Query this range container for all ranges overlapping the 1-based,
    /// end-inclusive range `[start, end]`, and call a visit function on each.
    pub fn query<F>(&self, start: Position, end: Position, visit: F)
    where
        F: FnMut(&IntervalNode<M, usize>),
    {
        // coitrees' "first" and "last" are both inclusive, like our ranges
        self.ranges.query(to_coord(start), to_coord(end), visit)
    }

    /// Count the ranges overlapping `[start, end]`.
    pub fn count_overlaps(&self, start: Position, end: Position) -> usize {
        self.ranges.query_count(to_coord(start), to_coord(end))
    }

    /// Return the number of ranges in this [`COITrees`] container.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Return whether the [`COITrees`] object is empty (contains no ranges).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a [`VecRanges`] range container to a [`COITrees`] range container.
impl<R: Clone + GenericInterval<M>, M: Clone> From<VecRanges<R>> for COITrees<M> {
    fn from(value: VecRanges<R>) -> Self {
        let ranges = BasicCOITree::new(&value.ranges);
        Self { ranges }
    }
}

impl<M: Clone> RangeContainer for COITrees<M> {
    fn len(&self) -> usize {
        self.ranges.len()
    }
}

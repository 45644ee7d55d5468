use crate::traits::RangeContainer;

use super::RangeIndexed;

pub type VecRangesIndexed = VecRanges<RangeIndexed>;

/// A growable, unindexed container of ranges on one chromosome, used to
/// collect ranges before they are frozen into a [`COITrees`].
///
/// [`COITrees`]: super::coitrees::COITrees
#[derive(Clone, Debug, Default)]
pub struct VecRanges<R: Clone> {
    pub(crate) ranges: Vec<R>,
}

impl<R: Clone> VecRanges<R> {
    /// Create a new empty [`VecRanges`] container.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Add a new range to the [`VecRanges`] container.
    pub fn push_range(&mut self, range: R) {
        self.ranges.push(range)
    }

    /// Return the number of ranges in this [`VecRanges`] container.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Return whether the [`VecRanges`] object is empty (contains no ranges).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Clone> RangeContainer for VecRanges<R> {
    fn len(&self) -> usize {
        self.ranges.len()
    }
}

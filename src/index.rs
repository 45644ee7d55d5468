//! The spatial index: per-chromosome interval trees over breakpoints or ranges.
//!
//! A [`SpatialIndex`] maps each chromosome name to a [`COITrees`] whose
//! intervals carry an integer slot. For breakpoints the slot encodes a
//! [`BreakpointHandle`]; for ranges it is the range's position in its list.
//! The index is read-only once built and is shared across workers.

use coitrees::GenericInterval;
use genomap::GenomeMap;
use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;

use crate::{
    arena::{Handle, RecordArena},
    error::VarsetsError,
    ranges::{
        coitrees::{COITrees, COITreesIndexed},
        vec::VecRangesIndexed,
        GenomicRange, RangeIndexed,
    },
    scheduler::WorkerPool,
    variants::BreakpointEnd,
    Position,
};

/// One end of one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointHandle {
    pub record: Handle,
    pub end: BreakpointEnd,
}

impl BreakpointHandle {
    pub fn new(record: Handle, end: BreakpointEnd) -> Self {
        Self { record, end }
    }

    fn encode(&self) -> usize {
        let end = match self.end {
            BreakpointEnd::First => 0,
            BreakpointEnd::Second => 1,
        };
        self.record * 2 + end
    }

    fn decode(slot: usize) -> Self {
        let end = if slot % 2 == 0 {
            BreakpointEnd::First
        } else {
            BreakpointEnd::Second
        };
        Self::new(slot / 2, end)
    }
}

/// Per-chromosome interval trees of indexed ranges.
pub struct SpatialIndex {
    trees: GenomeMap<COITreesIndexed>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("chromosomes", &self.trees.names())
            .finish()
    }
}

impl SpatialIndex {
    /// Build the index from ranges grouped by chromosome. Trees are built in
    /// parallel on `pool`, one chromosome per task.
    fn build(
        grouped: IndexMap<String, VecRangesIndexed>,
        pool: &WorkerPool,
    ) -> Result<Self, VarsetsError> {
        let grouped: Vec<(String, VecRangesIndexed)> = grouped.into_iter().collect();
        let built: Vec<(String, COITreesIndexed)> = pool.install(|| {
            grouped
                .into_par_iter()
                .map(|(chromosome, ranges)| (chromosome, COITrees::from(ranges)))
                .collect()
        });
        let mut trees = GenomeMap::new();
        for (chromosome, tree) in built {
            debug!("indexed {} intervals on {}", tree.len(), chromosome);
            trees.insert(&chromosome, tree)?;
        }
        Ok(Self { trees })
    }

    /// Index both breakpoints of every record in the arena.
    pub fn from_breakpoints(arena: &RecordArena, pool: &WorkerPool) -> Result<Self, VarsetsError> {
        let mut grouped: IndexMap<String, VecRangesIndexed> = IndexMap::new();
        for handle in arena.handles() {
            let call = arena.get(handle);
            for &end in call.breakpoint_ends() {
                let breakpoint = call.breakpoint(end);
                let slot = BreakpointHandle::new(handle, end).encode();
                grouped
                    .entry(breakpoint.chromosome.to_string())
                    .or_default()
                    .push_range(RangeIndexed::point(breakpoint.position, slot));
            }
        }
        Self::build(grouped, pool)
    }

    /// Index a list of genomic ranges; slots are positions in `ranges`.
    pub fn from_ranges(ranges: &[GenomicRange], pool: &WorkerPool) -> Result<Self, VarsetsError> {
        let mut grouped: IndexMap<String, VecRangesIndexed> = IndexMap::new();
        for (i, range) in ranges.iter().enumerate() {
            grouped
                .entry(range.chromosome.clone())
                .or_default()
                .push_range(RangeIndexed::new(range.start, range.end, i));
        }
        Self::build(grouped, pool)
    }

    /// The slots of all intervals on `chromosome` overlapping `[start, end]`.
    /// A chromosome absent from the index yields nothing.
    pub fn query_range(&self, chromosome: &str, start: Position, end: Position) -> Vec<usize> {
        let mut slots = Vec::new();
        if let Some(tree) = self.trees.get(chromosome) {
            tree.query(start, end, |node| slots.push(*node.metadata()));
        }
        slots
    }

    /// Whether any interval on `chromosome` contains `position`.
    pub fn contains(&self, chromosome: &str, position: Position) -> bool {
        self.trees
            .get(chromosome)
            .map_or(false, |tree| tree.count_overlaps(position, position) > 0)
    }

    /// The breakpoints on `chromosome` within `distance` basepairs of
    /// `position`, inclusive.
    ///
    /// coitrees visits hits through a callback, so the hits of one query
    /// are gathered before being handed back.
    pub fn query(
        &self,
        chromosome: &str,
        position: Position,
        distance: Position,
    ) -> impl Iterator<Item = BreakpointHandle> {
        let start = position.saturating_sub(distance);
        let end = position.saturating_add(distance);
        self.query_range(chromosome, start, end)
            .into_iter()
            .map(BreakpointHandle::decode)
    }

    pub fn chromosomes(&self) -> Vec<String> {
        self.trees.names()
    }

    /// The total number of indexed intervals.
    pub fn len(&self) -> usize {
        self.trees.values().map(|tree| tree.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

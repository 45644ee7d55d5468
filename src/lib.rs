//! # varsets: matching, clustering and set operations on variant calls
//!
//! `varsets` decides whether variant calls from different callers, samples
//! or platforms represent the same biological event, and builds set
//! operations on top of that decision: difference, intersection, merge,
//! self-collapse, overlap with genomic ranges, and row-wise filtering.
//!
//! Calls are matched breakpoint by breakpoint within a configurable window
//! (see [`criteria::MatchCriteria`]). Candidate pairs come from a
//! per-chromosome interval tree index, matching pairs become edges, and
//! clusters are the connected components of the resulting graph. Work is
//! partitioned by chromosome across a fixed-size worker pool, and every
//! result is deterministic regardless of the number of workers.
//!
//! ```no_run
//! use varsets::prelude::*;
//!
//! # fn main() -> Result<(), VarsetsError> {
//! let caller_a = read_variant_collection("caller_a.tsv", None)?;
//! let caller_b = read_variant_collection("caller_b.tsv", None)?;
//! let engine = VariantSetEngine::new(RunConfig::default())?;
//! let merged = engine.merge(&[&caller_a, &caller_b])?.into_value();
//! println!("{} merged calls", merged.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod arena;
pub mod cluster;
pub mod commands;
pub mod criteria;
pub mod error;
pub mod filters;
pub mod index;
pub mod io;
pub mod matching;
pub mod operations;
pub mod ranges;
pub mod reporting;
pub mod scheduler;
pub mod test_utilities;
pub mod traits;
pub mod variants;

/// 1-based genomic positions.
pub type Position = u32;

/// The largest position the interval index can hold.
pub const MAX_POSITION: Position = i32::MAX as Position;

pub mod prelude {
    pub use crate::cluster::{Cluster, ClusterBuilder, Clustering, EdgeScope};
    pub use crate::criteria::{MatchCriteria, RunConfig, RunConfigFile};
    pub use crate::error::VarsetsError;
    pub use crate::filters::VariantFilter;
    pub use crate::io::{read_bed_ranges, read_variant_collection, write_variant_calls, OutputFile};
    pub use crate::operations::{
        BreakpointRequirement, Comparison, IntersectOutput, OverlapOptions, Partitioned,
        VariantSetEngine,
    };
    pub use crate::ranges::GenomicRange;
    pub use crate::reporting::{CommandOutput, Report};
    pub use crate::traits::VariantMatcher;
    pub use crate::variants::{VariantCall, VariantCollection, VariantType};
}

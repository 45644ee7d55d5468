//! Set operations over variant call collections.
//!
//! The [`VariantSetEngine`] owns a validated [`RunConfig`] and a worker
//! pool. Each operation clusters its inputs (except overlap and filter,
//! which are row-wise) and interprets the clusters:
//!
//! | operation  | a record/cluster is kept when                            | output                    |
//! |------------|----------------------------------------------------------|---------------------------|
//! | diff       | its cluster has no member from a query collection        | target records            |
//! | intersect  | the cluster covers `min_collections` collections         | representatives or members |
//! | merge      | always                                                   | one record per cluster    |
//! | collapse   | always (clusters within one collection)                  | one record per cluster    |
//! | compare    | shared / first-only / second-only                        | three record lists        |
//! | overlap    | breakpoint(s) fall in a target range                     | kept and rejected records |
//!
//! Row-filtering results keep input order. Cluster-reducing results are
//! sorted by the representative's partition rank, `position_1`, `source_id`
//! and `sample_id`, with remaining ties in cluster order (see
//! [`Clustering::clusters()`]). Reducing an already reduced collection
//! therefore reproduces its order.

use log::info;
use rayon::prelude::*;

use crate::{
    aggregate::aggregate,
    arena::{Handle, RecordArena},
    cluster::{ClusterBuilder, Clustering, EdgeScope},
    criteria::RunConfig,
    error::VarsetsError,
    index::SpatialIndex,
    ranges::{operations::pad, GenomicRange},
    reporting::{CommandOutput, Report},
    scheduler::{Partitioning, WorkerPool},
    variants::{VariantCall, VariantCollection},
    Position,
};

/// What intersect returns for each qualifying cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntersectOutput {
    /// One aggregated record per cluster.
    #[default]
    Representatives,
    /// Every member of the cluster, in input order, tagged with its
    /// `cluster_id`.
    Members,
}

/// Which breakpoints of a call must fall within a range for overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BreakpointRequirement {
    /// Breakpoint-1 only.
    #[default]
    First,
    /// Breakpoint-1 or breakpoint-2.
    Either,
    /// Both breakpoints.
    Both,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlapOptions {
    /// Basepairs added to both sides of every range.
    pub padding: Position,
    pub requirement: BreakpointRequirement,
    /// Keep the records that do *not* overlap.
    pub invert: bool,
}

/// The records kept and rejected by a row-wise operation, both in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partitioned {
    pub kept: VariantCollection,
    pub rejected: VariantCollection,
}

/// The result of comparing two collections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison {
    /// Records of either collection whose cluster contains records of both,
    /// tagged with their `cluster_id`.
    pub shared: VariantCollection,
    pub first_only: VariantCollection,
    pub second_only: VariantCollection,
}

/// Runs set operations with a fixed configuration.
#[derive(Debug)]
pub struct VariantSetEngine {
    config: RunConfig,
    pool: WorkerPool,
}

impl VariantSetEngine {
    /// Validate `config` and start its worker pool.
    pub fn new(config: RunConfig) -> Result<Self, VarsetsError> {
        config.validate()?;
        let pool = WorkerPool::new(config.num_threads)?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Cluster the records of an arena.
    pub fn cluster(&self, arena: &RecordArena, scope: EdgeScope) -> Result<Clustering, VarsetsError> {
        ClusterBuilder::new(&self.config.criteria, scope).build(arena, &self.pool)
    }

    /// Aggregate each cluster that satisfies `keep`, in cluster order.
    fn reduce_clusters<F>(
        &self,
        arena: &RecordArena,
        clustering: &Clustering,
        keep: F,
    ) -> Result<Vec<VariantCall>, VarsetsError>
    where
        F: Fn(&crate::cluster::Cluster) -> bool + Sync,
    {
        let mut reduced: Vec<VariantCall> = self.pool.install(|| {
            clustering
                .clusters()
                .par_iter()
                .filter(|cluster| keep(cluster))
                .map(|cluster| {
                    let members: Vec<&VariantCall> =
                        cluster.members.iter().map(|&h| arena.get(h)).collect();
                    aggregate(&members)
                })
                .collect::<Result<Vec<_>, VarsetsError>>()
        })?;

        let partitioning = Partitioning::new(arena);
        let rank = |call: &VariantCall| {
            partitioning
                .rank(call.partition_chromosome())
                .unwrap_or(usize::MAX)
        };
        // stable, so ties keep cluster order
        reduced.sort_by(|x, y| {
            rank(x)
                .cmp(&rank(y))
                .then_with(|| x.position_1.cmp(&y.position_1))
                .then_with(|| x.source_id.cmp(&y.source_id))
                .then_with(|| x.sample_id.cmp(&y.sample_id))
        });
        Ok(reduced)
    }

    /// The records of `handles`, cloned, in handle (input) order.
    fn collect_records(
        arena: &RecordArena,
        name: &str,
        handles: impl Iterator<Item = Handle>,
    ) -> VariantCollection {
        VariantCollection::new(name, handles.map(|h| arena.get(h).clone()).collect())
    }

    /// Like [`Self::collect_records`], with each record tagged by its cluster.
    fn collect_members(
        arena: &RecordArena,
        clustering: &Clustering,
        name: &str,
        handles: impl Iterator<Item = Handle>,
    ) -> VariantCollection {
        let calls = handles
            .map(|h| {
                let mut call = arena.get(h).clone();
                call.cluster_id = Some(clustering.cluster_index(h) as u64);
                call
            })
            .collect();
        VariantCollection::new(name, calls)
    }

    /// Remove from `target` every record that clusters with a record of any
    /// of the `queries`.
    pub fn diff(
        &self,
        target: &VariantCollection,
        queries: &[&VariantCollection],
    ) -> Result<CommandOutput<VariantCollection>, VarsetsError> {
        if queries.is_empty() {
            return Err(VarsetsError::TooFewCollections("diff", 2, 1));
        }
        let mut inputs = vec![target];
        inputs.extend_from_slice(queries);
        let arena = RecordArena::new(&inputs);
        let clustering = self.cluster(&arena, EdgeScope::AcrossCollections)?;

        let retained = Self::collect_records(
            &arena,
            &target.name,
            arena.handles_of(0).filter(|&h| {
                clustering
                    .cluster_of(h)
                    .members
                    .iter()
                    .all(|&m| arena.collection_of(m) == 0)
            }),
        );

        let mut report = Report::new();
        report.add_issue(format!(
            "{} of {} records in '{}' have no match in {} query collection(s)",
            retained.len(),
            target.len(),
            target.name,
            queries.len()
        ));
        info!("diff retained {} of {} records", retained.len(), target.len());
        Ok(CommandOutput::new(retained, report))
    }

    /// Keep clusters whose provenance covers at least `min_collections` of
    /// the inputs (all of them by default).
    pub fn intersect(
        &self,
        collections: &[&VariantCollection],
        output: IntersectOutput,
    ) -> Result<CommandOutput<VariantCollection>, VarsetsError> {
        let n = collections.len();
        if n < 2 {
            return Err(VarsetsError::TooFewCollections("intersect", 2, n));
        }
        let min_collections = self.config.min_collections.unwrap_or(n);
        if min_collections == 0 || min_collections > n {
            return Err(VarsetsError::InvalidMinimumCollections(min_collections, n));
        }
        let arena = RecordArena::new(collections);
        let clustering = self.cluster(&arena, EdgeScope::AcrossCollections)?;
        let qualifies =
            |cluster: &crate::cluster::Cluster| cluster.provenance(&arena).len() >= min_collections;

        let name = "intersection";
        let result = match output {
            IntersectOutput::Representatives => VariantCollection::new(
                name,
                self.reduce_clusters(&arena, &clustering, qualifies)?,
            ),
            IntersectOutput::Members => Self::collect_members(
                &arena,
                &clustering,
                name,
                arena.handles().filter(|&h| qualifies(clustering.cluster_of(h))),
            ),
        };

        let mut report = Report::new();
        report.add_issue(format!(
            "{} records kept from clusters covering at least {} of {} collections",
            result.len(),
            min_collections,
            n
        ));
        info!("intersect kept {} records", result.len());
        Ok(CommandOutput::new(result, report))
    }

    /// Merge all collections into one record per cluster.
    pub fn merge(
        &self,
        collections: &[&VariantCollection],
    ) -> Result<CommandOutput<VariantCollection>, VarsetsError> {
        if collections.is_empty() {
            return Err(VarsetsError::TooFewCollections("merge", 1, 0));
        }
        let arena = RecordArena::new(collections);
        let clustering = self.cluster(&arena, EdgeScope::AcrossCollections)?;
        let merged = self.reduce_clusters(&arena, &clustering, |_| true)?;

        let mut report = Report::new();
        report.add_issue(format!(
            "{} input records merged into {} records",
            arena.len(),
            merged.len()
        ));
        Ok(CommandOutput::new(
            VariantCollection::new("merged", merged),
            report,
        ))
    }

    /// Deduplicate one collection: cluster its records with each other and
    /// reduce each cluster to a representative.
    pub fn collapse(
        &self,
        collection: &VariantCollection,
    ) -> Result<CommandOutput<VariantCollection>, VarsetsError> {
        let arena = RecordArena::new(&[collection]);
        let clustering = self.cluster(&arena, EdgeScope::Any)?;
        let collapsed = self.reduce_clusters(&arena, &clustering, |_| true)?;

        let mut report = Report::new();
        report.add_issue(format!(
            "{} records in '{}' collapsed into {} records",
            collection.len(),
            collection.name,
            collapsed.len()
        ));
        Ok(CommandOutput::new(
            VariantCollection::new(collection.name.clone(), collapsed),
            report,
        ))
    }

    /// Split two collections into shared records and records unique to each.
    pub fn compare(
        &self,
        first: &VariantCollection,
        second: &VariantCollection,
    ) -> Result<CommandOutput<Comparison>, VarsetsError> {
        let arena = RecordArena::new(&[first, second]);
        let clustering = self.cluster(&arena, EdgeScope::AcrossCollections)?;
        let is_shared = |h: Handle| clustering.cluster_of(h).provenance(&arena).len() == 2;

        let comparison = Comparison {
            shared: Self::collect_members(
                &arena,
                &clustering,
                "shared",
                arena.handles().filter(|&h| is_shared(h)),
            ),
            first_only: Self::collect_records(
                &arena,
                &first.name,
                arena.handles_of(0).filter(|&h| !is_shared(h)),
            ),
            second_only: Self::collect_records(
                &arena,
                &second.name,
                arena.handles_of(1).filter(|&h| !is_shared(h)),
            ),
        };

        let mut report = Report::new();
        report.add_issue(format!(
            "{} shared records, {} only in '{}', {} only in '{}'",
            comparison.shared.len(),
            comparison.first_only.len(),
            first.name,
            comparison.second_only.len(),
            second.name
        ));
        Ok(CommandOutput::new(comparison, report))
    }

    /// Keep the records whose breakpoints fall within `ranges`.
    pub fn overlap(
        &self,
        collection: &VariantCollection,
        ranges: &[GenomicRange],
        options: &OverlapOptions,
    ) -> Result<CommandOutput<Partitioned>, VarsetsError> {
        let padded: Vec<GenomicRange> = ranges.iter().map(|r| pad(r, options.padding)).collect();
        let index = SpatialIndex::from_ranges(&padded, &self.pool)?;

        let overlaps: Vec<bool> = self.pool.install(|| {
            collection
                .calls
                .par_iter()
                .map(|call| {
                    let first = index.contains(&call.chromosome_1, call.position_1);
                    let second = index.contains(&call.chromosome_2, call.position_2);
                    let hit = match options.requirement {
                        BreakpointRequirement::First => first,
                        BreakpointRequirement::Either => first || second,
                        BreakpointRequirement::Both => first && second,
                    };
                    hit != options.invert
                })
                .collect()
        });

        let mut result = Partitioned {
            kept: VariantCollection::new(collection.name.clone(), Vec::new()),
            rejected: VariantCollection::new(collection.name.clone(), Vec::new()),
        };
        for (call, keep) in collection.iter().zip(overlaps) {
            if keep {
                result.kept.push(call.clone());
            } else {
                result.rejected.push(call.clone());
            }
        }

        let mut report = Report::new();
        report.add_issue(format!(
            "{} of {} records kept by overlap with {} ranges (padding {})",
            result.kept.len(),
            collection.len(),
            ranges.len(),
            options.padding
        ));
        Ok(CommandOutput::new(result, report))
    }
}

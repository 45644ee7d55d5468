//! Cluster construction: connected components of the match graph.
//!
//! Candidate pairs come from the spatial index, so only calls with
//! breakpoints within the search window of each other are ever compared.
//! Each partition's worker emits the matching edges it owns (an edge is
//! owned by the partition of its smaller handle); the edges are then joined
//! with a union-find over handles.
//!
//! Clusters are connected components, so two members of one cluster need
//! not match each other directly.

use log::{debug, info};
use std::collections::BTreeSet;

use crate::{
    arena::{Handle, RecordArena},
    error::VarsetsError,
    index::SpatialIndex,
    scheduler::{Partition, Partitioning, WorkerPool},
    traits::VariantMatcher,
};

/// Disjoint sets over `0..n` with path compression and union by size.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    /// Find the representative of `x`'s set.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Join the sets of `a` and `b`; returns false if they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut root_a, mut root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return false;
        }
        if self.size[root_a] < self.size[root_b] {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b] = root_a;
        self.size[root_a] += self.size[root_b];
        true
    }
}

/// Which pairs of records may be joined by an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeScope {
    /// Only records from different input collections.
    AcrossCollections,
    /// Any two distinct records.
    Any,
}

/// One equivalence cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// Member handles, in the fixed total order.
    pub members: Vec<Handle>,
    /// Canonical rank of the partition that owns this cluster.
    pub partition: usize,
}

impl Cluster {
    /// The first member in the fixed total order.
    pub fn first(&self) -> Handle {
        self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The distinct input collections contributing to this cluster.
    pub fn provenance(&self, arena: &RecordArena) -> BTreeSet<usize> {
        self.members
            .iter()
            .map(|&handle| arena.collection_of(handle))
            .collect()
    }
}

/// The clusters of one run and the cluster of every handle.
#[derive(Clone, Debug)]
pub struct Clustering {
    clusters: Vec<Cluster>,
    cluster_of: Vec<usize>,
    num_edges: usize,
}

impl Clustering {
    /// Clusters in output order: by partition rank, then by the first
    /// member's `position_1`, then by the fixed total order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The cluster containing `handle`.
    pub fn cluster_of(&self, handle: Handle) -> &Cluster {
        &self.clusters[self.cluster_of[handle]]
    }

    /// The position of the cluster containing `handle` in [`Clustering::clusters()`].
    pub fn cluster_index(&self, handle: Handle) -> usize {
        self.cluster_of[handle]
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// The number of distinct matching edges found.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
}

/// Builds a [`Clustering`] for the records of an arena.
pub struct ClusterBuilder<'m, M: VariantMatcher> {
    matcher: &'m M,
    scope: EdgeScope,
}

impl<'m, M: VariantMatcher> ClusterBuilder<'m, M> {
    pub fn new(matcher: &'m M, scope: EdgeScope) -> Self {
        Self { matcher, scope }
    }

    /// The matching edges owned by one partition, sorted and deduplicated.
    fn partition_edges(
        &self,
        arena: &RecordArena,
        index: &SpatialIndex,
        partition: &Partition,
    ) -> Vec<(Handle, Handle)> {
        let distance = self.matcher.search_distance();
        let mut edges = Vec::new();
        for &handle in &partition.handles {
            let call = arena.get(handle);
            for &end in call.breakpoint_ends() {
                let breakpoint = call.breakpoint(end);
                for candidate in index.query(breakpoint.chromosome, breakpoint.position, distance) {
                    let other = candidate.record;
                    // each pair is owned by its smaller handle
                    if other <= handle {
                        continue;
                    }
                    if self.scope == EdgeScope::AcrossCollections
                        && arena.collection_of(handle) == arena.collection_of(other)
                    {
                        continue;
                    }
                    if self.matcher.matches(call, arena.get(other)) {
                        edges.push((handle, other));
                    }
                }
            }
        }
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Cluster every record of `arena`, using `pool` for index construction
    /// and candidate evaluation.
    pub fn build(
        &self,
        arena: &RecordArena,
        pool: &WorkerPool,
    ) -> Result<Clustering, VarsetsError> {
        let index = SpatialIndex::from_breakpoints(arena, pool)?;
        let partitioning = Partitioning::new(arena);
        let partition_edges = pool.map_partitions(&partitioning, |partition| {
            Ok(self.partition_edges(arena, &index, partition))
        })?;

        let mut union_find = UnionFind::new(arena.len());
        let mut num_edges = 0;
        for edges in &partition_edges {
            num_edges += edges.len();
            for &(a, b) in edges {
                union_find.union(a, b);
            }
        }

        // group handles by root, in handle order
        let mut group_of_root: Vec<Option<usize>> = vec![None; arena.len()];
        let mut groups: Vec<Vec<Handle>> = Vec::new();
        for handle in arena.handles() {
            let root = union_find.find(handle);
            let group = *group_of_root[root].get_or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(handle);
        }

        let mut clusters = Vec::with_capacity(groups.len());
        for mut members in groups {
            members.sort_by(|&a, &b| arena.fixed_order(a, b));
            let first = *members.first().ok_or_else(|| {
                VarsetsError::InternalInvariantViolation("empty cluster".to_string())
            })?;
            let chromosome = arena.get(first).partition_chromosome();
            let partition = partitioning.rank(chromosome).ok_or_else(|| {
                VarsetsError::InternalInvariantViolation(format!(
                    "no partition for chromosome '{}'",
                    chromosome
                ))
            })?;
            clusters.push(Cluster { members, partition });
        }
        clusters.sort_by(|x, y| {
            let (fx, fy) = (x.first(), y.first());
            x.partition
                .cmp(&y.partition)
                .then_with(|| arena.get(fx).position_1.cmp(&arena.get(fy).position_1))
                .then_with(|| arena.fixed_order(fx, fy))
        });

        let mut cluster_of = vec![usize::MAX; arena.len()];
        for (i, cluster) in clusters.iter().enumerate() {
            for &handle in &cluster.members {
                cluster_of[handle] = i;
            }
        }
        if let Some(orphan) = cluster_of.iter().position(|&c| c == usize::MAX) {
            return Err(VarsetsError::InternalInvariantViolation(format!(
                "record handle {} was assigned to no cluster",
                orphan
            )));
        }

        debug!(
            "{} partitions, {} matching edges",
            partitioning.len(),
            num_edges
        );
        info!(
            "clustered {} records into {} clusters",
            arena.len(),
            clusters.len()
        );
        Ok(Clustering {
            clusters,
            cluster_of,
            num_edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::MatchCriteria;
    use crate::test_utilities::{deletion, random_collection};
    use crate::variants::VariantCollection;

    fn criteria(distance: u32) -> MatchCriteria {
        MatchCriteria {
            max_neighbor_distance: distance,
            ..Default::default()
        }
    }

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        assert!(uf.union(0, 1));
        assert!(uf.union(3, 4));
        assert!(!uf.union(1, 0));
        assert!(uf.union(1, 4));
        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(2), uf.find(0));
    }

    #[test]
    fn test_transitive_bridging() {
        // a~b and b~c, but a and c are 16bp apart
        let x = VariantCollection::new("x", vec![deletion("a", "chr1", 100, 500)]);
        let y = VariantCollection::new("y", vec![deletion("b", "chr1", 108, 500)]);
        let z = VariantCollection::new("z", vec![deletion("c", "chr1", 116, 500)]);
        let arena = RecordArena::new(&[&x, &y, &z]);
        let criteria = criteria(10);
        assert!(!criteria.is_match(arena.get(0), arena.get(2)));

        let pool = WorkerPool::new(2).unwrap();
        let clustering = ClusterBuilder::new(&criteria, EdgeScope::AcrossCollections)
            .build(&arena, &pool)
            .unwrap();
        assert_eq!(clustering.len(), 1);
        assert_eq!(clustering.clusters()[0].members, vec![0, 1, 2]);
        assert_eq!(clustering.num_edges(), 2);
    }

    #[test]
    fn test_edge_scope() {
        let x = VariantCollection::new(
            "x",
            vec![deletion("a", "chr1", 100, 500), deletion("b", "chr1", 102, 500)],
        );
        let arena = RecordArena::new(&[&x]);
        let pool = WorkerPool::new(1).unwrap();
        let criteria = criteria(10);

        let across = ClusterBuilder::new(&criteria, EdgeScope::AcrossCollections)
            .build(&arena, &pool)
            .unwrap();
        assert_eq!(across.len(), 2);

        let any = ClusterBuilder::new(&criteria, EdgeScope::Any)
            .build(&arena, &pool)
            .unwrap();
        assert_eq!(any.len(), 1);
        assert_eq!(any.cluster_of(0), any.cluster_of(1));
    }

    #[test]
    fn test_every_record_in_exactly_one_cluster() {
        let a = random_collection("a", 2000);
        let b = random_collection("b", 2000);
        let arena = RecordArena::new(&[&a, &b]);
        let pool = WorkerPool::new(4).unwrap();
        let criteria = criteria(1000);
        let clustering = ClusterBuilder::new(&criteria, EdgeScope::AcrossCollections)
            .build(&arena, &pool)
            .unwrap();

        let mut seen = vec![0usize; arena.len()];
        for (i, cluster) in clustering.clusters().iter().enumerate() {
            assert!(!cluster.is_empty());
            for &handle in &cluster.members {
                seen[handle] += 1;
                assert_eq!(clustering.cluster_of(handle), &clustering.clusters()[i]);
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_matches_brute_force_components() {
        let a = random_collection("a", 300);
        let b = random_collection("b", 300);
        let arena = RecordArena::new(&[&a, &b]);
        let criteria = criteria(50_000);
        let pool = WorkerPool::new(3).unwrap();
        let clustering = ClusterBuilder::new(&criteria, EdgeScope::Any)
            .build(&arena, &pool)
            .unwrap();

        let mut uf = UnionFind::new(arena.len());
        for i in arena.handles() {
            for j in (i + 1)..arena.len() {
                if criteria.is_match(arena.get(i), arena.get(j)) {
                    uf.union(i, j);
                }
            }
        }
        for i in arena.handles() {
            for j in arena.handles() {
                let same = uf.find(i) == uf.find(j);
                assert_eq!(same, clustering.cluster_of(i) == clustering.cluster_of(j));
            }
        }
    }
}

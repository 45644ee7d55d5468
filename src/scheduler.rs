//! Chromosome partitioning and the fixed-size worker pool.
//!
//! Every record belongs to exactly one partition: the one named by the
//! lexicographically smaller of its two chromosomes. Partitions are kept in
//! canonical chromosome order, which is the order in which partition
//! chromosomes first appear across the input collections. Results computed
//! per partition are always returned in that order, regardless of which
//! worker finished first.

use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;

use crate::{
    arena::{Handle, RecordArena},
    error::VarsetsError,
};

/// The records of one chromosome partition, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    pub chromosome: String,
    pub handles: Vec<Handle>,
}

/// Partitions of an arena, in canonical chromosome order.
#[derive(Clone, Debug, Default)]
pub struct Partitioning {
    partitions: Vec<Partition>,
    rank: IndexMap<String, usize>,
}

impl Partitioning {
    pub fn new(arena: &RecordArena) -> Self {
        let mut grouped: IndexMap<String, Vec<Handle>> = IndexMap::new();
        for handle in arena.handles() {
            let chromosome = arena.get(handle).partition_chromosome();
            match grouped.get_mut(chromosome) {
                Some(handles) => handles.push(handle),
                None => {
                    grouped.insert(chromosome.to_string(), vec![handle]);
                }
            }
        }
        let rank = grouped
            .keys()
            .enumerate()
            .map(|(i, chromosome)| (chromosome.clone(), i))
            .collect();
        let partitions = grouped
            .into_iter()
            .map(|(chromosome, handles)| Partition {
                chromosome,
                handles,
            })
            .collect();
        Self { partitions, rank }
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// The canonical rank of the partition a chromosome names.
    pub fn rank(&self, chromosome: &str) -> Option<usize> {
        self.rank.get(chromosome).copied()
    }
}

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    num_threads: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads)
            .finish()
    }
}

impl WorkerPool {
    /// Build a pool of `num_threads` workers.
    pub fn new(num_threads: usize) -> Result<Self, VarsetsError> {
        if num_threads == 0 {
            return Err(VarsetsError::InvalidThreadCount(num_threads));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        Ok(Self { pool, num_threads })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Run `op` inside the pool, so that any parallel iterators it uses run
    /// on these workers.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Process every partition with `work` and return the owned partial
    /// results in canonical chromosome order.
    ///
    /// If any partition fails, the whole run fails and no partial results are
    /// returned.
    pub fn map_partitions<T, F>(
        &self,
        partitioning: &Partitioning,
        work: F,
    ) -> Result<Vec<T>, VarsetsError>
    where
        T: Send,
        F: Fn(&Partition) -> Result<T, VarsetsError> + Sync + Send,
    {
        self.install(|| {
            partitioning
                .partitions()
                .par_iter()
                .map(|partition| {
                    debug!(
                        "processing partition {} ({} records)",
                        partition.chromosome,
                        partition.handles.len()
                    );
                    work(partition)
                })
                .collect()
        })
    }
}

//! # tgraph: Partitioned Temporal Graph Query Core
//!
//! Answers "what are this node's neighbors as of time `t`" over a graph
//! split into independently loaded partitions, exactly (counts, full
//! enumeration) or by weighted random sampling.
//!
//! ## Design Principles
//!
//! 1. **Trait at the seam**: `ShardSource` is the contract between the
//!    query core and whatever loads partitions
//! 2. **Immutable after load**: a `Graph` is never mutated, so concurrent
//!    queries need no locks
//! 3. **Graph folds, partitions don't talk**: every partition answers for
//!    itself; the graph merges partial answers in registration order
//! 4. **Stateless randomness**: every draw comes from a sub-stream derived
//!    from `(seed, node, slot, lane)`
//!
//! ## Quick Start
//!
//! ```rust
//! use tgraph::{EdgeRecord, EdgeType, Graph, MemoryShard, Metadata, NodeId, PartitionData, StorageMode};
//!
//! # fn main() -> tgraph::Result<()> {
//! let shard = MemoryShard::new("mem").with_partition(
//!     0,
//!     PartitionData::new(1).with_node(0, vec![
//!         EdgeRecord::new(1, 0, 1.0).valid(0, 1),
//!         EdgeRecord::new(2, 0, 2.0).valid(0, 1),
//!     ]),
//! );
//! let graph = Graph::open(Metadata::new(1), &[shard], &[0], StorageMode::Memory)?;
//!
//! let counts = graph.neighbor_count(&[NodeId(0)], &[EdgeType(0)], &[0])?;
//! assert_eq!(counts, vec![2]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Query Surface
//!
//! | Operation | Output |
//! |-----------|--------|
//! | `neighbor_count` | alive neighbor count per node |
//! | `full_neighbor` | flat ids / types / weights + per-node counts |
//! | `sample_neighbor` | `k` weighted draws per node + total weight |
//! | `uniform_sample_neighbor` | `k` uniform draws per node + candidate count |
//! | `last_n_created` | `k` most recently created alive neighbors |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod index;
pub mod sampling;
pub mod storage;
pub mod query;

use std::marker::PhantomData;

use hashbrown::{HashMap, HashSet};
use rand::rngs::StdRng;
use rayon::prelude::*;
use smallvec::SmallVec;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    NodeId, EdgeType, Timestamp, NEVER_DELETED,
    EdgeRecord, Neighbor,
};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{
    ShardSource, StorageMode, PartitionData, Partition,
    MemoryShard, Metadata,
};

// ============================================================================
// Re-exports: Index, Sampling, Results
// ============================================================================

pub use index::{TemporalEdgeIndex, TypeFilter};
pub use sampling::{SampleDefaults, SampleRng, Weighting, WeightedReservoir};
pub use query::{FullNeighbors, SampledNeighbors, SampleBuffers};

use query::{check_output, check_timestamps, timestamp_at};
use sampling::ReservoirFold;

/// Batches smaller than this stay on one rayon worker.
const PAR_MIN_LEN: usize = 64;

// ============================================================================
// Top-level Graph handle
// ============================================================================

/// The primary entry point. A `Graph` owns its partitions and answers
/// batched neighbor queries across all of them.
///
/// `R` is the generator behind every random sub-stream.
pub struct Graph<R = StdRng> {
    partitions: Vec<Partition>,
    shard_sources: Vec<String>,
    /// node → ordinals of the partitions holding it, ascending
    routes: HashMap<NodeId, SmallVec<[u32; 2]>>,
    metadata: Metadata,
    storage_mode: StorageMode,
    _rng: PhantomData<fn() -> R>,
}

/// Graph sampling through `rand`'s standard generator.
impl Graph<StdRng> {
    /// Load one partition per `(shard_sources[i], partition_ids[i])` pair.
    pub fn open<S: ShardSource>(
        metadata: Metadata,
        shard_sources: &[S],
        partition_ids: &[u32],
        storage_mode: StorageMode,
    ) -> Result<Self> {
        Self::with_rng(metadata, shard_sources, partition_ids, storage_mode)
    }
}

impl<R: SampleRng> Graph<R> {
    /// Same as [`Graph::open`] with a caller-chosen generator type.
    ///
    /// Construction input is checked up front; any inconsistency fails the
    /// whole load.
    pub fn with_rng<S: ShardSource>(
        metadata: Metadata,
        shard_sources: &[S],
        partition_ids: &[u32],
        storage_mode: StorageMode,
    ) -> Result<Self> {
        metadata.validate()?;
        if shard_sources.len() != partition_ids.len() {
            return Err(Error::LengthMismatch {
                what: "partition_ids",
                expected: shard_sources.len(),
                got: partition_ids.len(),
            });
        }
        if partition_ids.is_empty() {
            return Err(Error::InvalidArgument("a graph needs at least one partition".into()));
        }
        let mut seen = HashSet::with_capacity(partition_ids.len());
        for &id in partition_ids {
            metadata.check_partition(id)?;
            if !seen.insert(id) {
                return Err(Error::DuplicatePartition(id));
            }
        }

        let partitions = shard_sources
            .par_iter()
            .zip(partition_ids.par_iter())
            .map(|(source, &id)| {
                let data = source.load(id, storage_mode)?;
                Partition::from_data(id, data, storage_mode)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut routes: HashMap<NodeId, SmallVec<[u32; 2]>> = HashMap::new();
        for (ordinal, partition) in partitions.iter().enumerate() {
            for node in partition.node_ids() {
                routes.entry(node).or_default().push(ordinal as u32);
            }
        }

        let edge_count: usize = partitions.iter().map(Partition::edge_count).sum();
        if let Some(expected) = metadata.node_count.filter(|&n| n != routes.len() as u64) {
            tracing::warn!(expected, loaded = routes.len(), "node count differs from metadata");
        }
        if let Some(expected) = metadata.edge_count.filter(|&n| n != edge_count as u64) {
            tracing::warn!(expected, loaded = edge_count, "edge count differs from metadata");
        }

        let graph = Self {
            partitions,
            shard_sources: shard_sources.iter().map(ShardSource::name).collect(),
            routes,
            metadata,
            storage_mode,
            _rng: PhantomData,
        };
        tracing::info!(
            partitions = graph.partitions.len(),
            nodes = graph.routes.len(),
            edges = edge_count,
            watermark = ?graph.watermark(),
            mode = ?storage_mode,
            "graph loaded"
        );
        Ok(graph)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Partitions in registration order.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn partition_ids(&self) -> Vec<u32> {
        self.partitions.iter().map(Partition::id).collect()
    }

    /// Name of the shard each partition was loaded from.
    pub fn shard_sources(&self) -> &[String] {
        &self.shard_sources
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    /// Latest watermark over all partitions.
    pub fn watermark(&self) -> Option<Timestamp> {
        self.partitions.iter().map(Partition::watermark).max()
    }

    /// Distinct node ids across all partitions.
    pub fn node_count(&self) -> usize {
        self.routes.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.routes.contains_key(&node)
    }

    /// Partitions holding `node` with its index there, registration order.
    fn holders(&self, node: NodeId) -> impl Iterator<Item = (&Partition, &TemporalEdgeIndex)> + '_ {
        self.routes
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(move |&ordinal| {
                let partition = &self.partitions[ordinal as usize];
                partition.index(node).map(|idx| (partition, idx))
            })
    }

    // ========================================================================
    // Neighbor count
    // ========================================================================

    /// Alive, type-matching neighbor count per node, summed over partitions.
    ///
    /// `timestamps` is empty (no time constraint) or one per node.
    pub fn neighbor_count(
        &self,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
    ) -> Result<Vec<u64>> {
        let mut out = vec![0; nodes.len()];
        self.neighbor_count_into(nodes, types, timestamps, &mut out)?;
        Ok(out)
    }

    /// [`Graph::neighbor_count`] into a caller buffer of `nodes.len()`.
    pub fn neighbor_count_into(
        &self,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
        out: &mut [u64],
    ) -> Result<()> {
        check_timestamps(nodes.len(), timestamps)?;
        check_output("counts", nodes.len(), out.len())?;
        tracing::trace!(nodes = nodes.len(), types = types.len(), "neighbor_count");

        let filter = TypeFilter::new(types);
        out.par_iter_mut()
            .with_min_len(PAR_MIN_LEN)
            .enumerate()
            .for_each(|(i, count)| {
                let at = timestamp_at(timestamps, i);
                *count = self.holders(nodes[i]).map(|(_, idx)| idx.count(&filter, at)).sum::<u64>();
            });
        Ok(())
    }

    // ========================================================================
    // Full neighbor
    // ========================================================================

    /// Every alive, type-matching neighbor per node. Within a node, entries
    /// follow partition registration order, then insertion order.
    pub fn full_neighbor(
        &self,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
    ) -> Result<FullNeighbors> {
        check_timestamps(nodes.len(), timestamps)?;
        tracing::trace!(nodes = nodes.len(), types = types.len(), "full_neighbor");

        let filter = &TypeFilter::new(types);
        let per_node: Vec<SmallVec<[Neighbor; 8]>> = (0..nodes.len())
            .into_par_iter()
            .with_min_len(PAR_MIN_LEN)
            .map(|i| {
                let at = timestamp_at(timestamps, i);
                self.holders(nodes[i])
                    .flat_map(move |(_, idx)| idx.enumerate(filter, at))
                    .collect()
            })
            .collect();

        let mut out = FullNeighbors::with_positions(nodes.len());
        let total: usize = per_node.iter().map(SmallVec::len).sum();
        out.ids.reserve(total);
        out.types.reserve(total);
        out.weights.reserve(total);
        for (i, neighbors) in per_node.into_iter().enumerate() {
            for n in neighbors {
                out.push(i, n);
            }
        }
        Ok(out)
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    /// `sample_count` weighted draws with replacement per node.
    ///
    /// Nodes without any alive, type-matching, positively weighted neighbor
    /// get `defaults` in every slot and a total weight of 0.
    pub fn sample_neighbor(
        &self,
        seed: u64,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
        sample_count: usize,
        defaults: SampleDefaults,
    ) -> Result<SampledNeighbors> {
        let mut out = SampledNeighbors::with_shape(nodes.len(), sample_count)?;
        self.sample_with(Weighting::EdgeWeight, seed, nodes, types, timestamps, sample_count, defaults, out.buffers())?;
        Ok(out)
    }

    /// [`Graph::sample_neighbor`] into caller buffers.
    #[allow(clippy::too_many_arguments)]
    pub fn sample_neighbor_into(
        &self,
        seed: u64,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
        sample_count: usize,
        defaults: SampleDefaults,
        out: SampleBuffers<'_>,
    ) -> Result<()> {
        self.sample_with(Weighting::EdgeWeight, seed, nodes, types, timestamps, sample_count, defaults, out)
    }

    /// `sample_count` uniform draws with replacement per node. The reported
    /// total is the number of alive candidates.
    pub fn uniform_sample_neighbor(
        &self,
        seed: u64,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
        sample_count: usize,
        defaults: SampleDefaults,
    ) -> Result<SampledNeighbors> {
        let mut out = SampledNeighbors::with_shape(nodes.len(), sample_count)?;
        self.sample_with(Weighting::Uniform, seed, nodes, types, timestamps, sample_count, defaults, out.buffers())?;
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn sample_with(
        &self,
        weighting: Weighting,
        seed: u64,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
        sample_count: usize,
        defaults: SampleDefaults,
        out: SampleBuffers<'_>,
    ) -> Result<()> {
        check_timestamps(nodes.len(), timestamps)?;
        out.check(nodes.len(), sample_count)?;
        tracing::trace!(nodes = nodes.len(), sample_count, ?weighting, "sample_neighbor");

        let filter = &TypeFilter::new(types);
        let folded: Vec<WeightedReservoir> = (0..nodes.len())
            .into_par_iter()
            .with_min_len(PAR_MIN_LEN)
            .map(|i| {
                let node = nodes[i];
                let at = timestamp_at(timestamps, i);
                let mut fold = ReservoirFold::<R>::new(seed, node, sample_count);
                for (partition, _) in self.holders(node) {
                    fold.fold(&partition.sample_node::<R>(seed, node, filter, at, sample_count, weighting));
                }
                fold.finish()
            })
            .collect();

        // Bounded by the checked `nodes.len() * sample_count` above
        for (i, reservoir) in folded.iter().enumerate() {
            let slots = i * sample_count..(i + 1) * sample_count;
            out.total_weights[i] = reservoir.write_into(
                &defaults,
                &mut out.ids[slots.clone()],
                &mut out.types[slots.clone()],
                &mut out.weights[slots],
            );
        }
        Ok(())
    }

    // ========================================================================
    // Most recent neighbors
    // ========================================================================

    /// Up to `count` alive neighbors per node with the latest creation time,
    /// newest first; ties keep partition then insertion order. Remaining
    /// slots get `defaults`. The reported total is the summed weight of the
    /// real entries.
    pub fn last_n_created(
        &self,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
        count: usize,
        defaults: SampleDefaults,
    ) -> Result<SampledNeighbors> {
        check_timestamps(nodes.len(), timestamps)?;
        let mut out = SampledNeighbors::with_shape(nodes.len(), count)?;
        tracing::trace!(nodes = nodes.len(), count, "last_n_created");

        let filter = &TypeFilter::new(types);
        let per_node: Vec<Vec<Neighbor>> = (0..nodes.len())
            .into_par_iter()
            .with_min_len(PAR_MIN_LEN)
            .map(|i| {
                let at = timestamp_at(timestamps, i);
                let mut latest: Vec<&EdgeRecord> = self
                    .holders(nodes[i])
                    .flat_map(move |(_, idx)| idx.last_created(filter, at, count))
                    .collect();
                latest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                latest.into_iter().take(count).map(EdgeRecord::neighbor).collect()
            })
            .collect();

        let fallback = defaults.neighbor();
        for (i, latest) in per_node.iter().enumerate() {
            for slot in 0..count {
                let n = latest.get(slot).copied().unwrap_or(fallback);
                out.ids[i * count + slot] = n.id;
                out.types[i * count + slot] = n.edge_type;
                out.weights[i * count + slot] = n.weight;
            }
            out.total_weights[i] = latest.iter().map(|n| n.weight).sum();
        }
        Ok(out)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch { what: &'static str, expected: usize, got: usize },

    #[error("Output buffer `{buffer}` has length {got}, expected {expected}")]
    OutputSize { buffer: &'static str, expected: usize, got: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid partition data: {0}")]
    InvalidPartition(String),

    #[error("Duplicate partition id {0}")]
    DuplicatePartition(u32),

    #[error("Inconsistent metadata: {0}")]
    InconsistentMetadata(String),

    #[error("Load error: {0}")]
    Load(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

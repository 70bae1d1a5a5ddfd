//! A loaded partition: one shard's nodes and their temporal edge indices.
//!
//! Partitions know nothing about each other. Every query here yields a
//! *partial* answer that the graph folds with the other partitions holding
//! the same node ids.

use hashbrown::HashMap;

use crate::index::{TemporalEdgeIndex, TypeFilter};
use crate::model::*;
use crate::query::{check_timestamps, timestamp_at, FullNeighbors};
use crate::sampling::{SampleRng, WeightedReservoir, Weighting};
use crate::{Error, Result};
use super::{PartitionData, StorageMode};

/// Immutable, queryable partition.
#[derive(Debug, Clone)]
pub struct Partition {
    id: u32,
    watermark: Timestamp,
    storage_mode: StorageMode,
    nodes: HashMap<NodeId, TemporalEdgeIndex>,
    edge_count: usize,
}

impl Partition {
    /// Build a partition from loaded data, validating every edge record.
    pub fn from_data(id: u32, data: PartitionData, storage_mode: StorageMode) -> Result<Self> {
        let edge_count = data.edge_count();
        let mut nodes = HashMap::with_capacity(data.nodes.len());

        for (node, edges) in data.nodes {
            for edge in &edges {
                edge.validate(node)?;
            }
            if nodes.insert(node, TemporalEdgeIndex::new(edges)).is_some() {
                return Err(Error::InvalidPartition(format!(
                    "partition {id} lists node {node} more than once"
                )));
            }
        }

        if nodes.is_empty() {
            tracing::warn!(partition = id, "partition holds no nodes");
        }
        tracing::debug!(
            partition = id,
            nodes = nodes.len(),
            edges = edge_count,
            watermark = data.watermark,
            mode = ?storage_mode,
            "partition loaded"
        );

        Ok(Self {
            id,
            watermark: data.watermark,
            storage_mode,
            nodes,
            edge_count,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Latest timestamp represented here. Never used as a query filter.
    pub fn watermark(&self) -> Timestamp {
        self.watermark
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn index(&self, node: NodeId) -> Option<&TemporalEdgeIndex> {
        self.nodes.get(&node)
    }

    // ========================================================================
    // Batch queries
    // ========================================================================

    /// Alive, type-matching neighbor count per query node; 0 for nodes this
    /// partition does not hold.
    pub fn neighbor_count(
        &self,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
    ) -> Result<Vec<u64>> {
        check_timestamps(nodes.len(), timestamps)?;
        let filter = TypeFilter::new(types);
        Ok(nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                self.index(*node)
                    .map_or(0, |idx| idx.count(&filter, timestamp_at(timestamps, i)))
            })
            .collect())
    }

    /// Flat neighbor lists in query order, insertion order within a node.
    pub fn full_neighbor(
        &self,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
    ) -> Result<FullNeighbors> {
        check_timestamps(nodes.len(), timestamps)?;
        let filter = TypeFilter::new(types);
        let mut out = FullNeighbors::with_positions(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if let Some(idx) = self.index(*node) {
                for n in idx.enumerate(&filter, timestamp_at(timestamps, i)) {
                    out.push(i, n);
                }
            }
        }
        Ok(out)
    }

    /// One partial reservoir per query node, carrying up to `sample_count`
    /// picks and the total weight this partition contributed.
    pub fn sample_neighbor<R: SampleRng>(
        &self,
        seed: u64,
        nodes: &[NodeId],
        types: &[EdgeType],
        timestamps: &[Timestamp],
        sample_count: usize,
    ) -> Result<Vec<WeightedReservoir>> {
        check_timestamps(nodes.len(), timestamps)?;
        let filter = TypeFilter::new(types);
        Ok(nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                self.sample_node::<R>(
                    seed,
                    *node,
                    &filter,
                    timestamp_at(timestamps, i),
                    sample_count,
                    Weighting::EdgeWeight,
                )
            })
            .collect())
    }

    /// Partial reservoir for a single node. Draws come from this
    /// partition's lane so they never repeat another partition's.
    pub(crate) fn sample_node<R: SampleRng>(
        &self,
        seed: u64,
        node: NodeId,
        filter: &TypeFilter,
        at: Option<Timestamp>,
        sample_count: usize,
        weighting: Weighting,
    ) -> WeightedReservoir {
        let mut reservoir = WeightedReservoir::new(node, sample_count);
        if let Some(idx) = self.index(node) {
            reservoir.absorb::<R, _>(
                seed,
                u64::from(self.id),
                idx.alive(filter, at).map(|e| (e.neighbor(), weighting.weight_of(e))),
            );
        }
        reservoir
    }
}

// ============================================================================
// Tests
// ============================================================================

//! # Shard Source Trait
//!
//! This is THE contract between the query core and the loading layer.
//! A shard source turns a partition id into validated-in-memory
//! [`PartitionData`]; everything after that is pure computation.
//!
//! ## Implementations
//!
//! | Source | Module | Description |
//! |--------|--------|-------------|
//! | `MemoryShard` | `memory` | In-memory for testing/embedding |

pub mod memory;
pub mod metadata;
pub mod partition;

use serde::{Deserialize, Serialize};
use crate::model::*;
use crate::Result;

pub use memory::MemoryShard;
pub use metadata::{Metadata, METADATA_FILE};
pub use partition::Partition;

// ============================================================================
// Storage mode
// ============================================================================

/// Residency of loaded partition data. Never changes query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageMode {
    /// Fully resident in process memory.
    #[default]
    Memory,
    /// Backed by memory-mapped files owned by the loading layer.
    MemoryMapped,
}

// ============================================================================
// Partition data
// ============================================================================

/// Raw content of one partition as handed over by a shard source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionData {
    /// Latest timestamp represented in this partition. Bookkeeping only.
    pub watermark: Timestamp,
    /// Source node → its edges, in insertion order.
    pub nodes: Vec<(NodeId, Vec<EdgeRecord>)>,
}

impl PartitionData {
    pub fn new(watermark: Timestamp) -> Self {
        Self {
            watermark,
            nodes: Vec::new(),
        }
    }

    pub fn with_node(mut self, id: impl Into<NodeId>, edges: Vec<EdgeRecord>) -> Self {
        self.nodes.push((id.into(), edges));
        self
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|(_, edges)| edges.len()).sum()
    }
}

// ============================================================================
// ShardSource Trait
// ============================================================================

/// Where partitions come from.
///
/// Implementations own decoding and I/O. Corrupt or unreadable data must be
/// reported here as `Error::Load`; the query core assumes what it receives
/// is well-formed apart from the per-edge checks it repeats at construction.
pub trait ShardSource: Send + Sync {
    /// Identifier of the shard, recorded by the graph for introspection.
    fn name(&self) -> String;

    /// Load one partition.
    fn load(&self, partition_id: u32, mode: StorageMode) -> Result<PartitionData>;
}

impl<S: ShardSource + ?Sized> ShardSource for &S {
    fn name(&self) -> String {
        (**self).name()
    }

    fn load(&self, partition_id: u32, mode: StorageMode) -> Result<PartitionData> {
        (**self).load(partition_id, mode)
    }
}

impl<S: ShardSource + ?Sized> ShardSource for std::sync::Arc<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn load(&self, partition_id: u32, mode: StorageMode) -> Result<PartitionData> {
        (**self).load(partition_id, mode)
    }
}

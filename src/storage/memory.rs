//! In-memory shard source.
//!
//! This is the reference implementation of `ShardSource`. Partitions are
//! plain `PartitionData` values keyed by partition id; loading clones them.
//!
//! Use this source for:
//! - Testing the partition, sampling and fan-out logic
//! - Embedding the query core where partitions are built in process

use hashbrown::HashMap;

use crate::{Error, Result};
use super::{PartitionData, ShardSource, StorageMode};

// ============================================================================
// MemoryShard
// ============================================================================

/// A named shard holding any number of partitions.
#[derive(Debug, Clone, Default)]
pub struct MemoryShard {
    name: String,
    partitions: HashMap<u32, PartitionData>,
}

impl MemoryShard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: HashMap::new(),
        }
    }

    /// Add (or replace) a partition.
    pub fn with_partition(mut self, partition_id: u32, data: PartitionData) -> Self {
        self.partitions.insert(partition_id, data);
        self
    }

    pub fn partition_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.partitions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl ShardSource for MemoryShard {
    fn name(&self) -> String {
        self.name.clone()
    }

    /// Storage mode is irrelevant here: data is already resident.
    fn load(&self, partition_id: u32, _mode: StorageMode) -> Result<PartitionData> {
        self.partitions
            .get(&partition_id)
            .cloned()
            .ok_or_else(|| Error::Load(format!("shard '{}' has no partition {partition_id}", self.name)))
    }
}

// ============================================================================
// Tests
// ============================================================================

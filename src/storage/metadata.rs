//! Graph metadata descriptor.
//!
//! Produced by the loading layer next to the partition files. The query
//! core reads only what it needs to validate construction.

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::{Error, Result};

/// File name of the descriptor inside a graph directory.
pub const METADATA_FILE: &str = "meta.json";

/// Counts describing a whole graph across its partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of partitions the graph was split into.
    pub partition_count: u32,
    /// Distinct nodes across all partitions, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<u64>,
    /// Edge records across all partitions, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_count: Option<u64>,
}

impl Metadata {
    pub fn new(partition_count: u32) -> Self {
        Self {
            partition_count,
            ..Self::default()
        }
    }

    pub fn with_counts(mut self, node_count: u64, edge_count: u64) -> Self {
        self.node_count = Some(node_count);
        self.edge_count = Some(edge_count);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let meta: Self = serde_json::from_str(json)?;
        meta.validate()?;
        Ok(meta)
    }

    /// Read `meta.json` from a graph directory.
    pub fn read_from(dir: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(dir.join(METADATA_FILE))?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.partition_count == 0 {
            return Err(Error::InconsistentMetadata("partition_count is 0".into()));
        }
        Ok(())
    }

    /// Partition ids must fall inside `0..partition_count`.
    pub fn check_partition(&self, partition_id: u32) -> Result<()> {
        if partition_id < self.partition_count {
            Ok(())
        } else {
            Err(Error::InconsistentMetadata(format!(
                "partition {partition_id} is outside 0..{}",
                self.partition_count
            )))
        }
    }
}

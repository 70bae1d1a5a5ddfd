//! Query results and argument checks.
//!
//! Results are flat parallel arrays plus a per-node count vector, so callers
//! can pre-size buffers and never pay a per-node allocation.

use crate::model::{EdgeType, Neighbor, NodeId, Timestamp};
use crate::{Error, Result};

// ============================================================================
// FullNeighbors
// ============================================================================

/// Result of a full neighbor enumeration.
///
/// `counts[i]` entries belong to query position `i`; the entries of position
/// `i` start at `counts[..i].sum()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullNeighbors {
    pub ids: Vec<NodeId>,
    pub types: Vec<EdgeType>,
    pub weights: Vec<f32>,
    pub counts: Vec<u64>,
}

impl FullNeighbors {
    /// Empty result for `positions` query nodes.
    pub fn with_positions(positions: usize) -> Self {
        Self {
            counts: vec![0; positions],
            ..Self::default()
        }
    }

    /// Number of flat entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn push(&mut self, position: usize, n: Neighbor) {
        self.ids.push(n.id);
        self.types.push(n.edge_type);
        self.weights.push(n.weight);
        self.counts[position] += 1;
    }

    /// Prefix sums of `counts`, one longer than `counts`.
    pub fn offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.counts.len() + 1);
        let mut acc = 0usize;
        offsets.push(acc);
        for &c in &self.counts {
            acc += c as usize;
            offsets.push(acc);
        }
        offsets
    }

    /// Neighbors of query position `position`, in output order.
    pub fn neighbors_of(&self, position: usize) -> Vec<Neighbor> {
        if position >= self.counts.len() {
            return Vec::new();
        }
        let start: usize = self.counts[..position].iter().map(|&c| c as usize).sum();
        let end = start + self.counts[position] as usize;
        (start..end)
            .map(|i| Neighbor {
                id: self.ids[i],
                edge_type: self.types[i],
                weight: self.weights[i],
            })
            .collect()
    }
}

// ============================================================================
// SampledNeighbors
// ============================================================================

/// Result of a sampling query: `sample_count` slots per query position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampledNeighbors {
    pub ids: Vec<NodeId>,
    pub types: Vec<EdgeType>,
    pub weights: Vec<f32>,
    pub total_weights: Vec<f32>,
    pub sample_count: usize,
}

impl SampledNeighbors {
    /// Zeroed result for `positions` query nodes with `sample_count` slots
    /// each. Fails when the slot count does not fit in `usize`.
    pub fn with_shape(positions: usize, sample_count: usize) -> Result<Self> {
        let slots = slot_count(positions, sample_count)?;
        Ok(Self {
            ids: vec![NodeId(0); slots],
            types: vec![EdgeType(0); slots],
            weights: vec![0.0; slots],
            total_weights: vec![0.0; positions],
            sample_count,
        })
    }

    pub fn positions(&self) -> usize {
        self.total_weights.len()
    }

    /// Sampled ids of query position `position`; empty when out of range.
    pub fn ids_of(&self, position: usize) -> &[NodeId] {
        if position >= self.positions() {
            return &[];
        }
        let start = position.saturating_mul(self.sample_count);
        self.ids
            .get(start..start.saturating_add(self.sample_count))
            .unwrap_or(&[])
    }

    pub fn buffers(&mut self) -> SampleBuffers<'_> {
        SampleBuffers {
            ids: &mut self.ids,
            types: &mut self.types,
            weights: &mut self.weights,
            total_weights: &mut self.total_weights,
        }
    }
}

/// Caller-owned output storage for sampling queries.
///
/// `ids`, `types` and `weights` hold `positions * sample_count` entries,
/// `total_weights` holds `positions`. Buffers are filled, never resized.
pub struct SampleBuffers<'a> {
    pub ids: &'a mut [NodeId],
    pub types: &'a mut [EdgeType],
    pub weights: &'a mut [f32],
    pub total_weights: &'a mut [f32],
}

impl SampleBuffers<'_> {
    pub(crate) fn check(&self, positions: usize, sample_count: usize) -> Result<()> {
        let slots = slot_count(positions, sample_count)?;
        check_output("ids", slots, self.ids.len())?;
        check_output("types", slots, self.types.len())?;
        check_output("weights", slots, self.weights.len())?;
        check_output("total_weights", positions, self.total_weights.len())
    }
}

// ============================================================================
// Argument checks
// ============================================================================

/// Timestamps are either absent (empty) or one per query node.
pub(crate) fn check_timestamps(nodes: usize, timestamps: &[Timestamp]) -> Result<()> {
    if timestamps.is_empty() || timestamps.len() == nodes {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            what: "timestamps",
            expected: nodes,
            got: timestamps.len(),
        })
    }
}

/// `positions * sample_count`, rejecting sizes that overflow.
pub(crate) fn slot_count(positions: usize, sample_count: usize) -> Result<usize> {
    positions.checked_mul(sample_count).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{positions} nodes x {sample_count} samples overflows the output size"
        ))
    })
}

#[inline]
pub(crate) fn timestamp_at(timestamps: &[Timestamp], position: usize) -> Option<Timestamp> {
    timestamps.get(position).copied()
}

pub(crate) fn check_output(buffer: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::OutputSize { buffer, expected, got })
    }
}

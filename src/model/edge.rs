//! Temporal edge records.

use serde::{Deserialize, Serialize};
use super::{EdgeType, NodeId, Timestamp, NEVER_DELETED};
use crate::{Error, Result};

/// One outgoing edge of a node inside one partition.
///
/// The edge is valid over `[created_at, deleted_at)`; `deleted_at ==
/// NEVER_DELETED` leaves the interval open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub dst: NodeId,
    pub edge_type: EdgeType,
    pub weight: f32,
    pub created_at: Timestamp,
    pub deleted_at: Timestamp,
}

impl EdgeRecord {
    /// An edge alive from time 0 onwards.
    pub fn new(dst: impl Into<NodeId>, edge_type: impl Into<EdgeType>, weight: f32) -> Self {
        Self {
            dst: dst.into(),
            edge_type: edge_type.into(),
            weight,
            created_at: 0,
            deleted_at: NEVER_DELETED,
        }
    }

    /// Set the validity interval.
    pub fn valid(mut self, created_at: Timestamp, deleted_at: Timestamp) -> Self {
        self.created_at = created_at;
        self.deleted_at = deleted_at;
        self
    }

    pub fn is_open_ended(&self) -> bool {
        self.deleted_at == NEVER_DELETED
    }

    /// Whether the edge exists at time `t`.
    #[inline]
    pub fn is_alive(&self, t: Timestamp) -> bool {
        self.created_at <= t && (self.is_open_ended() || t < self.deleted_at)
    }

    pub fn neighbor(&self) -> Neighbor {
        Neighbor {
            id: self.dst,
            edge_type: self.edge_type,
            weight: self.weight,
        }
    }

    /// Reject records the query layer cannot reason about.
    pub(crate) fn validate(&self, src: NodeId) -> Result<()> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(Error::InvalidPartition(format!(
                "edge {src}->{} has weight {}, expected a finite non-negative value",
                self.dst, self.weight
            )));
        }
        if !self.is_open_ended() && self.created_at > self.deleted_at {
            return Err(Error::InvalidPartition(format!(
                "edge {src}->{} is deleted at {} before it is created at {}",
                self.dst, self.deleted_at, self.created_at
            )));
        }
        Ok(())
    }
}

/// A neighbor as reported to callers: destination, type, weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: NodeId,
    pub edge_type: EdgeType,
    pub weight: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alive_interval_is_half_open() {
        let e = EdgeRecord::new(1, 0, 1.0).valid(2, 5);
        assert!(!e.is_alive(1));
        assert!(e.is_alive(2));
        assert!(e.is_alive(4));
        assert!(!e.is_alive(5));
    }

    #[test]
    fn test_never_deleted_is_open_ended() {
        let e = EdgeRecord::new(1, 0, 1.0).valid(3, NEVER_DELETED);
        assert!(e.is_open_ended());
        assert!(!e.is_alive(2));
        assert!(e.is_alive(3));
        assert!(e.is_alive(i64::MAX));
    }

    #[test]
    fn test_empty_interval_is_never_alive() {
        let e = EdgeRecord::new(1, 0, 1.0).valid(4, 4);
        assert!(e.validate(NodeId(0)).is_ok());
        assert!(!e.is_alive(4));
    }

    #[test]
    fn test_validate_rejects_bad_records() {
        let src = NodeId(7);
        assert!(EdgeRecord::new(1, 0, -1.0).validate(src).is_err());
        assert!(EdgeRecord::new(1, 0, f32::NAN).validate(src).is_err());
        assert!(EdgeRecord::new(1, 0, 1.0).valid(5, 2).validate(src).is_err());
        assert!(EdgeRecord::new(1, 0, 0.0).valid(5, NEVER_DELETED).validate(src).is_ok());
    }
}

//! Node, edge-type and time identifiers.

use serde::{Deserialize, Serialize};

/// Opaque node identifier.
///
/// Ids are signed and need not be contiguous. An id that no partition holds
/// is a valid query input and simply has no neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub i64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        NodeId(id)
    }
}

/// Edge type tag. A node's neighbor list mixes types; queries admit a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeType(pub i32);

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for EdgeType {
    fn from(t: i32) -> Self {
        EdgeType(t)
    }
}

/// Logical, monotonic time unit.
pub type Timestamp = i64;

/// Sentinel for `deleted_at`: the edge was never deleted.
pub const NEVER_DELETED: Timestamp = -1;

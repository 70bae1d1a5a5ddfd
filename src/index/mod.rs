//! Temporal edge index: one node's edges inside one partition.
//!
//! Answers "which neighbors are alive at time `t` with a type in `S`",
//! always in insertion order so results are reproducible.

use smallvec::SmallVec;
use crate::model::{EdgeRecord, EdgeType, Neighbor, Timestamp};

// ============================================================================
// Type filter
// ============================================================================

/// Set of admissible edge types.
///
/// An empty filter admits nothing; callers that want every type pass every
/// type explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilter {
    types: SmallVec<[EdgeType; 4]>,
}

impl TypeFilter {
    pub fn new(types: &[EdgeType]) -> Self {
        let mut types: SmallVec<[EdgeType; 4]> = types.iter().copied().collect();
        types.sort_unstable();
        types.dedup();
        Self { types }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    pub fn admits(&self, edge_type: EdgeType) -> bool {
        self.types.binary_search(&edge_type).is_ok()
    }

    pub fn types(&self) -> &[EdgeType] {
        &self.types
    }
}

impl From<&[EdgeType]> for TypeFilter {
    fn from(types: &[EdgeType]) -> Self {
        Self::new(types)
    }
}

// ============================================================================
// TemporalEdgeIndex
// ============================================================================

/// Edges of one source node in one partition, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalEdgeIndex {
    edges: Vec<EdgeRecord>,
}

impl TemporalEdgeIndex {
    pub fn new(edges: Vec<EdgeRecord>) -> Self {
        Self { edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    /// Edges admitted by `types` and alive at `at`.
    ///
    /// `at == None` means the caller did not constrain time: the time filter
    /// is skipped entirely, deleted edges included.
    pub fn alive<'a>(
        &'a self,
        types: &'a TypeFilter,
        at: Option<Timestamp>,
    ) -> impl Iterator<Item = &'a EdgeRecord> + 'a {
        self.edges.iter().filter(move |e| {
            types.admits(e.edge_type) && at.is_none_or(|t| e.is_alive(t))
        })
    }

    pub fn count(&self, types: &TypeFilter, at: Option<Timestamp>) -> u64 {
        if types.is_empty() {
            return 0;
        }
        self.alive(types, at).count() as u64
    }

    pub fn enumerate<'a>(
        &'a self,
        types: &'a TypeFilter,
        at: Option<Timestamp>,
    ) -> impl Iterator<Item = Neighbor> + 'a {
        self.alive(types, at).map(EdgeRecord::neighbor)
    }

    /// Up to `n` alive edges with the latest `created_at`, newest first.
    /// Ties keep insertion order.
    pub fn last_created<'a>(
        &'a self,
        types: &'a TypeFilter,
        at: Option<Timestamp>,
        n: usize,
    ) -> Vec<&'a EdgeRecord> {
        let mut picked: Vec<&EdgeRecord> = self.alive(types, at).collect();
        picked.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        picked.truncate(n);
        picked
    }
}

// ============================================================================
// Tests
// ============================================================================

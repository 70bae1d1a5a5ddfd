//! # Weighted Reservoir Sampling
//!
//! Streams `(candidate, weight)` pairs into `k` independent with-replacement
//! slots. For each candidate the running total grows by `w` and every slot
//! switches to the candidate with probability `w / total`. After the stream
//! each slot holds a draw proportional to weight, without the candidate set
//! ever being materialized.
//!
//! The same rule folds partial reservoirs: a partition's reservoir acts as a
//! single candidate weighted by that partition's total. This is what lets
//! the graph sample a node whose edges are spread over several partitions.
//!
//! ```text
//! partition 0 ──absorb──► partial(total w0) ─┐
//! partition 1 ──absorb──► partial(total w1) ─┼─ ReservoirFold ─► slots + Σw
//! partition 2 ──absorb──► partial(total w2) ─┘   (merge lane)
//! ```

pub mod stream;

use rand::Rng;
use crate::model::{EdgeRecord, EdgeType, Neighbor, NodeId};

pub use stream::{SampleRng, StreamKey, MERGE_LANE, slot_streams};

// ============================================================================
// Defaults and weighting
// ============================================================================

/// Fill used for every slot of a node that has no candidate at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleDefaults {
    pub node: NodeId,
    pub edge_type: EdgeType,
    pub weight: f32,
}

impl SampleDefaults {
    pub fn new(node: impl Into<NodeId>, edge_type: impl Into<EdgeType>, weight: f32) -> Self {
        Self {
            node: node.into(),
            edge_type: edge_type.into(),
            weight,
        }
    }

    pub fn neighbor(&self) -> Neighbor {
        Neighbor {
            id: self.node,
            edge_type: self.edge_type,
            weight: self.weight,
        }
    }
}

impl Default for SampleDefaults {
    fn default() -> Self {
        Self::new(-1, -1, 0.0)
    }
}

/// How a candidate edge is weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Proportional to the edge weight.
    #[default]
    EdgeWeight,
    /// Every alive edge counts 1.
    Uniform,
}

impl Weighting {
    #[inline]
    pub fn weight_of(self, edge: &EdgeRecord) -> f64 {
        match self {
            Weighting::EdgeWeight => f64::from(edge.weight),
            Weighting::Uniform => 1.0,
        }
    }
}

// ============================================================================
// WeightedReservoir
// ============================================================================

/// `k` sample slots for one node plus the total weight offered so far.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedReservoir {
    node: NodeId,
    picks: Vec<Option<Neighbor>>,
    total_weight: f64,
}

impl WeightedReservoir {
    pub fn new(node: NodeId, sample_count: usize) -> Self {
        Self {
            node,
            picks: vec![None; sample_count],
            total_weight: 0.0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn sample_count(&self) -> usize {
        self.picks.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// True while no candidate with positive weight has been seen.
    pub fn is_empty(&self) -> bool {
        self.total_weight <= 0.0
    }

    pub fn picks(&self) -> &[Option<Neighbor>] {
        &self.picks
    }

    /// Offer one candidate. `streams` holds one generator per slot.
    pub fn offer<R: SampleRng>(&mut self, candidate: Neighbor, weight: f64, streams: &mut [R]) {
        debug_assert_eq!(streams.len(), self.picks.len());
        self.total_weight += weight;
        let total = self.total_weight;
        for (slot, rng) in self.picks.iter_mut().zip(streams.iter_mut()) {
            let u: f64 = rng.r#gen();
            if u * total < weight {
                *slot = Some(candidate);
            }
        }
    }

    /// Stream a whole candidate sequence on `lane`.
    pub fn absorb<R, I>(&mut self, seed: u64, lane: u64, candidates: I)
    where
        R: SampleRng,
        I: IntoIterator<Item = (Neighbor, f64)>,
    {
        let mut candidates = candidates.into_iter().peekable();
        if candidates.peek().is_none() {
            return;
        }
        let mut streams: Vec<R> = slot_streams(seed, self.node, lane, self.picks.len());
        for (candidate, weight) in candidates {
            self.offer(candidate, weight, &mut streams);
        }
    }

    /// Write the slots into caller buffers, substituting `defaults` when the
    /// node had no weighted candidate. Returns the total weight.
    pub fn write_into(
        &self,
        defaults: &SampleDefaults,
        ids: &mut [NodeId],
        types: &mut [EdgeType],
        weights: &mut [f32],
    ) -> f32 {
        let fallback = defaults.neighbor();
        let empty = self.is_empty();
        for (i, pick) in self.picks.iter().enumerate() {
            let n = match pick {
                Some(n) if !empty => *n,
                _ => fallback,
            };
            ids[i] = n.id;
            types[i] = n.edge_type;
            weights[i] = n.weight;
        }
        if empty { 0.0 } else { self.total_weight as f32 }
    }
}

// ============================================================================
// ReservoirFold
// ============================================================================

/// Folds partition-local reservoirs of one node, in a fixed order.
///
/// Merge-lane generators are only built once two non-empty partials meet:
/// folding into an empty accumulator switches with probability `w / w = 1`.
pub struct ReservoirFold<R: SampleRng> {
    seed: u64,
    acc: WeightedReservoir,
    streams: Option<Vec<R>>,
}

impl<R: SampleRng> ReservoirFold<R> {
    pub fn new(seed: u64, node: NodeId, sample_count: usize) -> Self {
        Self {
            seed,
            acc: WeightedReservoir::new(node, sample_count),
            streams: None,
        }
    }

    pub fn fold(&mut self, partial: &WeightedReservoir) {
        debug_assert_eq!(partial.sample_count(), self.acc.sample_count());
        let w = partial.total_weight;
        if w <= 0.0 {
            return;
        }
        if self.acc.is_empty() {
            self.acc.picks.clone_from(&partial.picks);
            self.acc.total_weight += w;
            return;
        }

        let (seed, node, slots) = (self.seed, self.acc.node, self.acc.picks.len());
        let streams = self
            .streams
            .get_or_insert_with(|| slot_streams(seed, node, MERGE_LANE, slots));

        self.acc.total_weight += w;
        let total = self.acc.total_weight;
        for ((slot, incoming), rng) in self
            .acc
            .picks
            .iter_mut()
            .zip(partial.picks.iter())
            .zip(streams.iter_mut())
        {
            let u: f64 = rng.r#gen();
            if u * total < w {
                *slot = *incoming;
            }
        }
    }

    pub fn finish(self) -> WeightedReservoir {
        self.acc
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn nb(id: i64, weight: f32) -> Neighbor {
        Neighbor { id: NodeId(id), edge_type: EdgeType(0), weight }
    }

    fn absorb(seed: u64, k: usize, lane: u64, cands: &[(i64, f32)]) -> WeightedReservoir {
        let mut r = WeightedReservoir::new(NodeId(0), k);
        r.absorb::<StdRng, _>(seed, lane, cands.iter().map(|&(id, w)| (nb(id, w), f64::from(w))));
        r
    }

    #[test]
    fn test_single_candidate_fills_every_slot() {
        let r = absorb(1, 5, 0, &[(9, 0.25)]);
        assert!(r.picks().iter().all(|p| *p == Some(nb(9, 0.25))));
        assert_eq!(r.total_weight(), 0.25);
    }

    #[test]
    fn test_zero_weight_candidates_are_never_picked() {
        let r = absorb(3, 16, 0, &[(1, 0.0), (2, 2.0), (3, 0.0)]);
        assert!(r.picks().iter().all(|p| *p == Some(nb(2, 2.0))));
        assert_eq!(r.total_weight(), 2.0);
    }

    #[test]
    fn test_all_zero_weight_falls_back_to_defaults() {
        let r = absorb(3, 3, 0, &[(1, 0.0), (2, 0.0)]);
        assert!(r.is_empty());

        let defaults = SampleDefaults::new(42, 13, 0.5);
        let mut ids = vec![NodeId(0); 3];
        let mut types = vec![EdgeType(0); 3];
        let mut weights = vec![0.0; 3];
        let total = r.write_into(&defaults, &mut ids, &mut types, &mut weights);

        assert_eq!(total, 0.0);
        assert_eq!(ids, vec![NodeId(42); 3]);
        assert_eq!(types, vec![EdgeType(13); 3]);
        assert_eq!(weights, vec![0.5; 3]);
    }

    #[test]
    fn test_absorb_is_deterministic() {
        let cands = [(1, 1.0), (2, 3.0), (3, 0.5), (4, 2.0)];
        assert_eq!(absorb(77, 8, 2, &cands), absorb(77, 8, 2, &cands));
    }

    #[test]
    fn test_fold_into_empty_adopts_partial() {
        let partial = absorb(5, 4, 0, &[(1, 1.0), (2, 2.0)]);
        let mut fold = ReservoirFold::<StdRng>::new(5, NodeId(0), 4);
        fold.fold(&WeightedReservoir::new(NodeId(0), 4));
        fold.fold(&partial);
        let merged = fold.finish();
        assert_eq!(merged.picks(), partial.picks());
        assert_eq!(merged.total_weight(), 3.0);
    }

    #[test]
    fn test_fold_sums_totals_and_keeps_known_picks() {
        let a = absorb(5, 6, 0, &[(1, 1.0)]);
        let b = absorb(5, 6, 1, &[(2, 4.0)]);
        let mut fold = ReservoirFold::<StdRng>::new(5, NodeId(0), 6);
        fold.fold(&a);
        fold.fold(&b);
        let merged = fold.finish();
        assert_eq!(merged.total_weight(), 5.0);
        for p in merged.picks() {
            assert!(*p == Some(nb(1, 1.0)) || *p == Some(nb(2, 4.0)));
        }
    }
}

//! Property tests: graph answers agree with a brute-force scan over the raw
//! edge lists, across partitions and timestamps.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use tgraph::{
    EdgeRecord, EdgeType, Graph, MemoryShard, Metadata, NodeId, PartitionData, SampleDefaults,
    StorageMode, Timestamp, NEVER_DELETED,
};

const PARTITIONS: u32 = 3;
const NODES: i64 = 5;

/// `(partition, src, record)` triples in generation order.
type Placed = Vec<(u32, i64, EdgeRecord)>;

fn edge_strategy() -> impl Strategy<Value = (u32, i64, EdgeRecord)> {
    (
        0..PARTITIONS,
        0..NODES,
        0i64..20,
        0i32..3,
        0u8..5,
        0i64..10,
        prop::option::of(0i64..10),
    )
        .prop_map(|(partition, src, dst, ty, weight, created, lifetime)| {
            let deleted = lifetime.map_or(NEVER_DELETED, |l| created + l);
            (partition, src, EdgeRecord::new(dst, ty, f32::from(weight)).valid(created, deleted))
        })
}

fn build(placed: &Placed) -> Graph {
    let mut grouped: BTreeMap<u32, BTreeMap<i64, Vec<EdgeRecord>>> = BTreeMap::new();
    for (partition, src, edge) in placed {
        grouped.entry(*partition).or_default().entry(*src).or_default().push(*edge);
    }
    let mut shard = MemoryShard::new("prop");
    for partition in 0..PARTITIONS {
        let mut data = PartitionData::new(i64::from(partition));
        for (src, edges) in grouped.remove(&partition).unwrap_or_default() {
            data = data.with_node(src, edges);
        }
        shard = shard.with_partition(partition, data);
    }
    let sources = vec![&shard; PARTITIONS as usize];
    let ids: Vec<u32> = (0..PARTITIONS).collect();
    Graph::open(Metadata::new(PARTITIONS), &sources, &ids, StorageMode::Memory).unwrap()
}

/// Matching edges of `src` in partition order, then insertion order.
fn oracle<'a>(
    placed: &'a Placed,
    src: i64,
    types: &'a [EdgeType],
    at: Option<Timestamp>,
) -> Vec<&'a EdgeRecord> {
    (0..PARTITIONS)
        .flat_map(|p| {
            placed.iter().filter(move |(partition, s, _)| *partition == p && *s == src)
        })
        .map(|(_, _, e)| e)
        .filter(|e| types.contains(&e.edge_type) && at.is_none_or(|t| e.is_alive(t)))
        .collect()
}

fn query_strategy() -> impl Strategy<Value = (Vec<EdgeType>, Option<Timestamp>)> {
    (
        prop::collection::vec((0i32..4).prop_map(EdgeType), 0..4),
        prop::option::of(0i64..20),
    )
}

proptest! {
    #[test]
    fn count_and_full_neighbor_match_scan(
        placed in prop::collection::vec(edge_strategy(), 0..60),
        (types, at) in query_strategy(),
    ) {
        let graph = build(&placed);
        let nodes: Vec<NodeId> = (0..NODES + 1).map(NodeId).collect();
        let timestamps: Vec<Timestamp> = at.map(|t| vec![t; nodes.len()]).unwrap_or_default();

        let counts = graph.neighbor_count(&nodes, &types, &timestamps).unwrap();
        let full = graph.full_neighbor(&nodes, &types, &timestamps).unwrap();
        prop_assert_eq!(&counts, &full.counts);
        prop_assert_eq!(full.len() as u64, counts.iter().sum::<u64>());

        for (i, node) in nodes.iter().enumerate() {
            let expected = oracle(&placed, node.0, &types, at);
            let got = full.neighbors_of(i);
            prop_assert_eq!(got.len(), expected.len());
            for (n, e) in got.iter().zip(&expected) {
                prop_assert_eq!(*n, e.neighbor());
            }
        }
    }

    #[test]
    fn graph_count_is_sum_of_partition_counts(
        placed in prop::collection::vec(edge_strategy(), 0..60),
        (types, at) in query_strategy(),
    ) {
        let graph = build(&placed);
        let nodes: Vec<NodeId> = (0..NODES).map(NodeId).collect();
        let timestamps: Vec<Timestamp> = at.map(|t| vec![t; nodes.len()]).unwrap_or_default();

        let total = graph.neighbor_count(&nodes, &types, &timestamps).unwrap();
        let mut summed = vec![0u64; nodes.len()];
        for partition in graph.partitions() {
            let partial = partition.neighbor_count(&nodes, &types, &timestamps).unwrap();
            for (acc, c) in summed.iter_mut().zip(partial) {
                *acc += c;
            }
        }
        prop_assert_eq!(total, summed);
    }

    #[test]
    fn single_edge_is_alive_exactly_in_its_interval(
        created in 0i64..50,
        lifetime in prop::option::of(0i64..50),
        probe in 0i64..120,
    ) {
        let deleted = lifetime.map_or(NEVER_DELETED, |l| created + l);
        let shard = MemoryShard::new("one").with_partition(
            0,
            PartitionData::new(0).with_node(0, vec![EdgeRecord::new(1, 0, 1.0).valid(created, deleted)]),
        );
        let graph = Graph::open(Metadata::new(1), &[shard], &[0], StorageMode::Memory).unwrap();
        let count = graph.neighbor_count(&[NodeId(0)], &[EdgeType(0)], &[probe]).unwrap()[0];

        let alive = probe >= created && (deleted == NEVER_DELETED || probe < deleted);
        prop_assert_eq!(count, u64::from(alive));
    }

    #[test]
    fn samples_come_from_alive_candidates(
        placed in prop::collection::vec(edge_strategy(), 0..60),
        (types, at) in query_strategy(),
        seed in any::<u64>(),
        k in 0usize..6,
    ) {
        let graph = build(&placed);
        let nodes: Vec<NodeId> = (0..NODES + 1).map(NodeId).collect();
        let timestamps: Vec<Timestamp> = at.map(|t| vec![t; nodes.len()]).unwrap_or_default();
        let defaults = SampleDefaults::new(-1, -1, 0.0);

        let out = graph.sample_neighbor(seed, &nodes, &types, &timestamps, k, defaults).unwrap();
        let again = graph.sample_neighbor(seed, &nodes, &types, &timestamps, k, defaults).unwrap();
        prop_assert_eq!(&out, &again);
        prop_assert_eq!(out.ids.len(), nodes.len() * k);

        for (i, node) in nodes.iter().enumerate() {
            let candidates = oracle(&placed, node.0, &types, at);
            let expected_total: f32 = candidates.iter().map(|e| e.weight).sum();
            prop_assert_eq!(out.total_weights[i], expected_total);

            let positive: HashSet<i64> = candidates
                .iter()
                .filter(|e| e.weight > 0.0)
                .map(|e| e.dst.0)
                .collect();
            for slot in i * k..(i + 1) * k {
                if positive.is_empty() {
                    prop_assert_eq!(out.ids[slot], NodeId(-1));
                    prop_assert_eq!(out.types[slot], EdgeType(-1));
                } else {
                    prop_assert!(positive.contains(&out.ids[slot].0));
                    prop_assert!(out.weights[slot] > 0.0);
                }
            }
        }
    }

    #[test]
    fn last_n_created_is_newest_first(
        placed in prop::collection::vec(edge_strategy(), 0..60),
        (types, at) in query_strategy(),
        n in 0usize..5,
    ) {
        let graph = build(&placed);
        let nodes: Vec<NodeId> = (0..NODES).map(NodeId).collect();
        let timestamps: Vec<Timestamp> = at.map(|t| vec![t; nodes.len()]).unwrap_or_default();
        let out = graph
            .last_n_created(&nodes, &types, &timestamps, n, SampleDefaults::default())
            .unwrap();

        for (i, node) in nodes.iter().enumerate() {
            let mut expected = oracle(&placed, node.0, &types, at);
            expected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            expected.truncate(n);

            for (slot, e) in expected.iter().enumerate() {
                prop_assert_eq!(out.ids[i * n + slot], e.dst);
            }
            for slot in expected.len()..n {
                prop_assert_eq!(out.ids[i * n + slot], NodeId(-1));
            }
            let total: f32 = expected.iter().map(|e| e.weight).sum();
            prop_assert_eq!(out.total_weights[i], total);
        }
    }
}

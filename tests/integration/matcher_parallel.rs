#![allow(missing_docs)]

//! Parallel matcher suites: single-thread equivalence across worker and
//! range configurations, both merge strategies, and cancellation.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rastro::data_gen::{random_graph, GraphSpec};
use rastro::graph::Graph;
use rastro::query::ast::{EdgeDirection, PatternChain};
use rastro::query::{
    MatchTable, Matcher, ParallelConfig, ParallelMatcher, PatternBuilder, PatternCompiler,
};
use rastro::types::EngineError;

fn sorted_rows(graph: &Graph, table: &MatchTable) -> Vec<Vec<u64>> {
    let mut rows: Vec<Vec<u64>> = (0..table.row_count())
        .map(|row| {
            (0..table.column_count())
                .map(|col| graph.element_id(table.get(row, col)))
                .collect()
        })
        .collect();
    rows.sort();
    rows
}

fn two_hop() -> Vec<PatternChain> {
    PatternBuilder::new()
        .vertex_typed("a", "V0")
        .edge_typed(EdgeDirection::Out, "E0")
        .vertex("b")
        .edge(EdgeDirection::Both)
        .vertex("c")
        .build()
        .unwrap()
}

fn shared_pair() -> Vec<PatternChain> {
    PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "E0")
        .vertex("b")
        .chain()
        .vertex("c")
        .edge_typed(EdgeDirection::Out, "E1")
        .vertex("b")
        .build()
        .unwrap()
}

#[test]
fn worker_and_range_configurations_agree_with_single_thread() {
    let graph = random_graph(&GraphSpec {
        vertices: 48,
        edges: 180,
        seed: 7,
        ..GraphSpec::default()
    });
    for chains in [two_hop(), shared_pair()] {
        let output = PatternCompiler::new(graph.catalog()).compile(chains).unwrap();
        let mut single = Matcher::new(&graph, &output.pattern);
        single.run_all();
        let expected = sorted_rows(&graph, single.results());

        for workers in [1, 2, 3, 8] {
            for range_size in [1, 7, 64, 4096] {
                let config = ParallelConfig {
                    workers,
                    range_size,
                    cancel: None,
                };
                let merged = ParallelMatcher::with_config(&graph, config)
                    .run(&output.pattern)
                    .unwrap();
                assert_eq!(
                    sorted_rows(&graph, &merged),
                    expected,
                    "workers={workers} range_size={range_size}"
                );
            }
        }
    }
}

#[test]
fn row_merge_path_preserves_the_multiset() {
    let graph = random_graph(&GraphSpec {
        vertices: 64,
        edges: 256,
        seed: 11,
        ..GraphSpec::default()
    });
    // Two columns and eight workers: workers / 2 > columns selects the
    // recursive row merge.
    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "E0")
        .vertex("b")
        .build()
        .unwrap();
    let output = PatternCompiler::new(graph.catalog()).compile(chains).unwrap();
    let mut single = Matcher::new(&graph, &output.pattern);
    single.run_all();

    let config = ParallelConfig {
        workers: 8,
        range_size: 4,
        cancel: None,
    };
    let merged = ParallelMatcher::with_config(&graph, config)
        .run(&output.pattern)
        .unwrap();
    assert_eq!(sorted_rows(&graph, &merged), sorted_rows(&graph, single.results()));
}

#[test]
fn column_merge_path_keeps_rows_aligned() {
    let graph = random_graph(&GraphSpec {
        vertices: 64,
        edges: 256,
        seed: 13,
        ..GraphSpec::default()
    });
    // Four columns and four workers: workers / 2 > columns is false, so the
    // partitions merge column by column; rows must stay aligned across
    // columns afterwards.
    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_named_typed(EdgeDirection::Out, "e", "E0")
        .vertex("b")
        .edge_typed(EdgeDirection::Out, "E1")
        .vertex("c")
        .build()
        .unwrap();
    let output = PatternCompiler::new(graph.catalog()).compile(chains).unwrap();
    let mut single = Matcher::new(&graph, &output.pattern);
    single.run_all();

    let config = ParallelConfig {
        workers: 4,
        range_size: 8,
        cancel: None,
    };
    let merged = ParallelMatcher::with_config(&graph, config)
        .run(&output.pattern)
        .unwrap();
    assert_eq!(sorted_rows(&graph, &merged), sorted_rows(&graph, single.results()));
}

#[test]
fn parallel_rerun_is_idempotent() {
    let graph = random_graph(&GraphSpec {
        vertices: 32,
        edges: 96,
        seed: 17,
        ..GraphSpec::default()
    });
    let output = PatternCompiler::new(graph.catalog())
        .compile(two_hop())
        .unwrap();
    let matcher = ParallelMatcher::new(&graph);
    let first = matcher.run(&output.pattern).unwrap();
    let second = matcher.run(&output.pattern).unwrap();
    assert_eq!(sorted_rows(&graph, &first), sorted_rows(&graph, &second));
}

#[test]
fn tripped_cancel_flag_stops_the_search() {
    let graph = random_graph(&GraphSpec {
        vertices: 32,
        edges: 64,
        seed: 19,
        ..GraphSpec::default()
    });
    let output = PatternCompiler::new(graph.catalog())
        .compile(two_hop())
        .unwrap();
    let flag = Arc::new(AtomicBool::new(true));
    let config = ParallelConfig {
        workers: 2,
        range_size: 4,
        cancel: Some(Arc::clone(&flag)),
    };
    let err = ParallelMatcher::with_config(&graph, config)
        .run(&output.pattern)
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
}

#[test]
fn zero_workers_rejected() {
    let graph = random_graph(&GraphSpec::default());
    let output = PatternCompiler::new(graph.catalog())
        .compile(two_hop())
        .unwrap();
    let config = ParallelConfig {
        workers: 0,
        range_size: 16,
        cancel: None,
    };
    let err = ParallelMatcher::with_config(&graph, config)
        .run(&output.pattern)
        .unwrap_err();
    assert!(matches!(err, EngineError::Invalid(_)));
}

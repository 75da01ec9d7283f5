#![allow(missing_docs)]

//! End-to-end single-thread matcher suites over hand-built graphs.

use rastro::graph::{Catalog, Graph, GraphBuilder, TableKind};
use rastro::query::ast::EdgeDirection;
use rastro::query::{MatchTable, Matcher, PatternBuilder, PatternCompiler};

/// Vertices {1,2,3}: Person, out-edges {(1->2),(2->3)}: Knows.
fn knows_path() -> Graph {
    let mut catalog = Catalog::new();
    let person = catalog.add_vertex_table("Person", 2).unwrap();
    let knows = catalog.add_edge_table("Knows", 0).unwrap();
    let mut builder = GraphBuilder::new(catalog);
    for id in 1..=3 {
        builder.add_vertex(id, person).unwrap();
    }
    builder.add_edge(1, knows, 1, 2).unwrap();
    builder.add_edge(2, knows, 2, 3).unwrap();
    builder.build().unwrap()
}

fn run(graph: &Graph, chains: Vec<rastro::query::ast::PatternChain>) -> MatchTable {
    let output = PatternCompiler::new(graph.catalog()).compile(chains).unwrap();
    let mut matcher = Matcher::new(graph, &output.pattern);
    matcher.run_all();
    matcher.into_results()
}

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

#[test]
fn two_hop_typed_path_yields_the_single_binding() {
    let graph = knows_path();
    let chains = PatternBuilder::new()
        .vertex_typed("a", "Person")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex_typed("b", "Person")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex_typed("c", "Person")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    assert_eq!(sorted_rows(&graph, &table), vec![vec![1, 2, 3]]);
}

#[test]
fn shared_variable_chains_match_like_the_joined_path() {
    let graph = knows_path();
    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("b")
        .chain()
        .vertex("b")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("c")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    assert_eq!(sorted_rows(&graph, &table), vec![vec![1, 2, 3]]);
}

#[test]
fn anonymous_head_binds_only_the_named_tail() {
    let graph = knows_path();
    let chains = PatternBuilder::new()
        .anon_vertex()
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("x")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    assert_eq!(table.column_count(), 1, "anonymous slots get no column");
    assert_eq!(sorted_rows(&graph, &table), vec![vec![2], vec![3]]);
}

#[test]
fn split_and_unsplit_forms_bind_the_same_rows() {
    let graph = knows_path();
    let joined = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("b")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("c")
        .build()
        .unwrap();
    let split = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("b")
        .chain()
        .vertex("b")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("c")
        .build()
        .unwrap();
    let joined_table = run(&graph, joined);
    let split_table = run(&graph, split);
    assert_eq!(
        sorted_rows(&graph, &joined_table),
        sorted_rows(&graph, &split_table),
        "splitting changes search order, never the binding set"
    );
}

#[test]
fn type_filter_restricts_every_bound_element() {
    let mut catalog = Catalog::new();
    let person = catalog.add_vertex_table("Person", 1).unwrap();
    let city = catalog.add_vertex_table("City", 1).unwrap();
    let knows = catalog.add_edge_table("Knows", 0).unwrap();
    let lives_in = catalog.add_edge_table("LivesIn", 0).unwrap();
    let mut builder = GraphBuilder::new(catalog);
    builder.add_vertex(1, person).unwrap();
    builder.add_vertex(2, person).unwrap();
    builder.add_vertex(3, city).unwrap();
    builder.add_edge(1, knows, 1, 2).unwrap();
    builder.add_edge(2, lives_in, 2, 3).unwrap();
    builder.add_edge(3, lives_in, 1, 3).unwrap();
    let graph = builder.build().unwrap();

    let chains = PatternBuilder::new()
        .vertex_typed("p", "Person")
        .edge_typed(EdgeDirection::Out, "LivesIn")
        .vertex_typed("c", "City")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    assert_eq!(sorted_rows(&graph, &table), vec![vec![1, 3], vec![2, 3]]);
    let city_table = graph.catalog().vertex_table("City").unwrap();
    for row in 0..table.row_count() {
        let bound = table.get(row, 1);
        assert_eq!(graph.element_table(bound), city_table);
        assert_eq!(
            graph.catalog().table(graph.element_table(bound)).kind,
            TableKind::Vertex
        );
    }
}

#[test]
fn distinct_variables_reject_the_same_vertex() {
    let mut catalog = Catalog::new();
    let person = catalog.add_vertex_table("Person", 0).unwrap();
    let knows = catalog.add_edge_table("Knows", 0).unwrap();
    let mut builder = GraphBuilder::new(catalog);
    builder.add_vertex(1, person).unwrap();
    builder.add_vertex(2, person).unwrap();
    builder.add_edge(1, knows, 1, 1).unwrap(); // self-loop
    builder.add_edge(2, knows, 1, 2).unwrap();
    let graph = builder.build().unwrap();

    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("b")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    // The self-loop would need a == b and is excluded.
    assert_eq!(sorted_rows(&graph, &table), vec![vec![1, 2]]);
}

#[test]
fn repeated_variable_closes_the_cycle() {
    let mut catalog = Catalog::new();
    let person = catalog.add_vertex_table("Person", 0).unwrap();
    let knows = catalog.add_edge_table("Knows", 0).unwrap();
    let mut builder = GraphBuilder::new(catalog);
    for id in 1..=3 {
        builder.add_vertex(id, person).unwrap();
    }
    builder.add_edge(1, knows, 1, 2).unwrap();
    builder.add_edge(2, knows, 2, 3).unwrap();
    builder.add_edge(3, knows, 3, 1).unwrap();
    let graph = builder.build().unwrap();

    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("b")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("c")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("a")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    assert_eq!(
        sorted_rows(&graph, &table),
        vec![vec![1, 2, 3], vec![2, 3, 1], vec![3, 1, 2]]
    );
}

#[test]
fn distinct_edge_variables_exhaust_parallel_edges() {
    let mut catalog = Catalog::new();
    let person = catalog.add_vertex_table("Person", 0).unwrap();
    let knows = catalog.add_edge_table("Knows", 0).unwrap();
    let mut builder = GraphBuilder::new(catalog);
    builder.add_vertex(1, person).unwrap();
    builder.add_vertex(2, person).unwrap();
    builder.add_edge(10, knows, 1, 2).unwrap();
    builder.add_edge(11, knows, 1, 2).unwrap();
    let graph = builder.build().unwrap();

    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_named_typed(EdgeDirection::Out, "e", "Knows")
        .vertex("b")
        .chain()
        .vertex("a")
        .edge_named_typed(EdgeDirection::Out, "f", "Knows")
        .vertex("b")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    // Columns in first-appearance order: a, e, b, f.
    assert_eq!(
        sorted_rows(&graph, &table),
        vec![vec![1, 10, 2, 11], vec![1, 11, 2, 10]]
    );
}

#[test]
fn any_direction_edge_matches_both_orientations() {
    let graph = knows_path();
    let chains = PatternBuilder::new()
        .vertex("a")
        .edge(EdgeDirection::Both)
        .vertex("b")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    assert_eq!(
        sorted_rows(&graph, &table),
        vec![vec![1, 2], vec![2, 1], vec![2, 3], vec![3, 2]]
    );
}

#[test]
fn unconnected_conjunctions_produce_the_cross_product() {
    let graph = knows_path();
    let chains = PatternBuilder::new()
        .vertex_typed("a", "Person")
        .chain()
        .vertex_typed("b", "Person")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    // Ordered pairs of distinct vertices: 3 * 2.
    assert_eq!(table.row_count(), 6);
    for row in 0..table.row_count() {
        let a = graph.element_id(table.get(row, 0));
        let b = graph.element_id(table.get(row, 1));
        assert_ne!(a, b, "distinct variables may not share an element");
    }
}

#[test]
fn zero_matches_is_an_empty_table_not_an_error() {
    let graph = knows_path();
    // The graph holds no three-hop path.
    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("b")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("c")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("d")
        .build()
        .unwrap();
    let table = run(&graph, chains);
    assert!(table.is_empty());
    assert_eq!(table.column_count(), 4);
}

#[test]
fn rerun_on_an_unmodified_graph_is_identical() {
    let graph = knows_path();
    let chains = PatternBuilder::new()
        .vertex("a")
        .edge_typed(EdgeDirection::Out, "Knows")
        .vertex("b")
        .build()
        .unwrap();
    let output = PatternCompiler::new(graph.catalog()).compile(chains).unwrap();
    let mut first = Matcher::new(&graph, &output.pattern);
    first.run_all();
    let mut second = Matcher::new(&graph, &output.pattern);
    second.run_all();
    assert_eq!(
        sorted_rows(&graph, first.results()),
        sorted_rows(&graph, second.results())
    );
}

//! Deterministic random graph generation for tests and benches.
//!
//! Graphs are produced from a fixed seed so equivalence suites can replay
//! the exact same topology across runs and worker configurations.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::graph::{Catalog, Graph, GraphBuilder};
use crate::types::TableId;

/// Shape of a generated graph.
#[derive(Clone, Debug)]
pub struct GraphSpec {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of edges; endpoints are drawn uniformly.
    pub edges: usize,
    /// Number of vertex tables, named `V0`, `V1`, ...
    pub vertex_tables: usize,
    /// Number of edge tables, named `E0`, `E1`, ...
    pub edge_tables: usize,
    /// Seed for the deterministic generator.
    pub seed: u64,
}

impl Default for GraphSpec {
    fn default() -> Self {
        Self {
            vertices: 64,
            edges: 256,
            vertex_tables: 2,
            edge_tables: 2,
            seed: 0,
        }
    }
}

/// Generates a graph with the requested shape.
///
/// Vertex ids start at 1 and edge ids also start at 1, so the two id
/// spaces overlap the way real loads do. Self-loops and parallel edges
/// are allowed.
pub fn random_graph(spec: &GraphSpec) -> Graph {
    assert!(spec.vertices > 0, "graph needs at least one vertex");
    assert!(spec.vertex_tables > 0 && spec.edge_tables > 0, "graph needs tables");
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);

    let mut catalog = Catalog::new();
    let vertex_tables: Vec<TableId> = (0..spec.vertex_tables)
        .map(|i| {
            catalog
                .add_vertex_table(&format!("V{i}"), 1)
                .expect("fresh vertex table name")
        })
        .collect();
    let edge_tables: Vec<TableId> = (0..spec.edge_tables)
        .map(|i| {
            catalog
                .add_edge_table(&format!("E{i}"), 1)
                .expect("fresh edge table name")
        })
        .collect();

    let mut builder = GraphBuilder::new(catalog);
    for id in 1..=spec.vertices as u64 {
        let table = vertex_tables[rng.gen_range(0..vertex_tables.len())];
        builder.add_vertex(id, table).expect("vertex insert");
    }
    for id in 1..=spec.edges as u64 {
        let table = edge_tables[rng.gen_range(0..edge_tables.len())];
        let source = rng.gen_range(1..=spec.vertices as u64);
        let target = rng.gen_range(1..=spec.vertices as u64);
        builder.add_edge(id, table, source, target).expect("edge insert");
    }
    builder.build().expect("generated graph is well formed")
}

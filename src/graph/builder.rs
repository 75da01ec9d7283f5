//! One-shot graph construction.
//!
//! The builder accumulates vertices and edges in any order and lays out the
//! CSR-style arrays in [`build`](GraphBuilder::build). Graphs are immutable
//! afterwards.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{Catalog, EdgeRecord, EdgeSpan, Graph, TableKind, Vertex};
use crate::types::{EdgeId, EngineError, Result, TableId, VertexId};

struct PendingEdge {
    id: u64,
    table: TableId,
    source: u64,
    target: u64,
}

/// Accumulates vertices and edges, then freezes them into a [`Graph`].
pub struct GraphBuilder {
    catalog: Catalog,
    vertices: Vec<(u64, TableId)>,
    edges: Vec<PendingEdge>,
}

impl GraphBuilder {
    /// Starts a builder over the given catalog.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Adds a vertex with an explicit id.
    pub fn add_vertex(&mut self, id: u64, table: TableId) -> Result<()> {
        if self.catalog.table(table).kind != TableKind::Vertex {
            return Err(EngineError::Invalid("vertex added with an edge table"));
        }
        self.vertices.push((id, table));
        Ok(())
    }

    /// Adds an edge between two vertex ids.
    pub fn add_edge(&mut self, id: u64, table: TableId, source: u64, target: u64) -> Result<()> {
        if self.catalog.table(table).kind != TableKind::Edge {
            return Err(EngineError::Invalid("edge added with a vertex table"));
        }
        self.edges.push(PendingEdge {
            id,
            table,
            source,
            target,
        });
        Ok(())
    }

    /// Freezes the accumulated elements into an immutable graph.
    pub fn build(self) -> Result<Graph> {
        let mut vertices = self.vertices;
        vertices.sort_by_key(|(id, _)| *id);
        let mut positions: FxHashMap<u64, u32> = FxHashMap::default();
        for (pos, (id, _)) in vertices.iter().enumerate() {
            if positions.insert(*id, pos as u32).is_some() {
                return Err(EngineError::InvalidOwned(format!("duplicate vertex id {id}")));
            }
        }

        let mut seen_edge_ids: FxHashSet<u64> = FxHashSet::default();
        let mut fwd: Vec<(u32, u64, TableId, u32)> = Vec::with_capacity(self.edges.len());
        let mut rev: Vec<(u32, u64, TableId, u32)> = Vec::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !seen_edge_ids.insert(edge.id) {
                return Err(EngineError::InvalidOwned(format!(
                    "duplicate edge id {}",
                    edge.id
                )));
            }
            let src = *positions.get(&edge.source).ok_or_else(|| {
                EngineError::InvalidOwned(format!("edge {} references unknown vertex {}", edge.id, edge.source))
            })?;
            let dst = *positions.get(&edge.target).ok_or_else(|| {
                EngineError::InvalidOwned(format!("edge {} references unknown vertex {}", edge.id, edge.target))
            })?;
            fwd.push((src, edge.id, edge.table, dst));
            rev.push((dst, edge.id, edge.table, src));
        }
        fwd.sort_by_key(|&(owner, id, _, _)| (owner, id));
        rev.sort_by_key(|&(owner, id, _, _)| (owner, id));

        let out_edges = materialize(&fwd);
        let in_edges = materialize(&rev);

        let mut built: Vec<Vertex> = vertices
            .into_iter()
            .enumerate()
            .map(|(pos, (id, table))| Vertex {
                id: VertexId(id),
                table,
                position: pos as u32,
                out_span: None,
                in_span: None,
            })
            .collect();
        assign_spans(&mut built, &fwd, |v, span| v.out_span = span);
        assign_spans(&mut built, &rev, |v, span| v.in_span = span);

        Ok(Graph::from_parts(self.catalog, built, out_edges, in_edges))
    }
}

fn materialize(slots: &[(u32, u64, TableId, u32)]) -> Vec<EdgeRecord> {
    slots
        .iter()
        .enumerate()
        .map(|(pos, &(_, id, table, endpoint))| EdgeRecord {
            id: EdgeId(id),
            table,
            position: pos as u32,
            endpoint,
        })
        .collect()
}

fn assign_spans(
    vertices: &mut [Vertex],
    slots: &[(u32, u64, TableId, u32)],
    set: impl Fn(&mut Vertex, Option<EdgeSpan>),
) {
    let mut i = 0usize;
    while i < slots.len() {
        let owner = slots[i].0;
        let start = i;
        while i < slots.len() && slots[i].0 == owner {
            i += 1;
        }
        set(
            &mut vertices[owner as usize],
            Some(EdgeSpan {
                start: start as u32,
                end: i as u32,
            }),
        );
    }
}

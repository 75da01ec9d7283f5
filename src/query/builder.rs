//! Fluent builder for parsed pattern chains.
//!
//! Stands in for the out-of-scope text parser: tests and embedders construct
//! [`PatternChain`]s programmatically instead of writing query text. Slot
//! ordering mistakes are deferred and reported once from [`build`].
//!
//! [`build`]: PatternBuilder::build

use crate::query::ast::{EdgeDirection, NodeKind, PatternChain, PatternNode};
use crate::types::{EngineError, Result};

/// Fluent constructor for a list of pattern chains.
#[derive(Default)]
pub struct PatternBuilder {
    chains: Vec<PatternChain>,
    current: Vec<PatternNode>,
    error: Option<EngineError>,
}

impl PatternBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named, untyped vertex slot.
    pub fn vertex(self, name: &str) -> Self {
        self.push_vertex(Some(name), None)
    }

    /// Adds a named vertex slot constrained to a type.
    pub fn vertex_typed(self, name: &str, table: &str) -> Self {
        self.push_vertex(Some(name), Some(table))
    }

    /// Adds an anonymous, untyped vertex slot.
    pub fn anon_vertex(self) -> Self {
        self.push_vertex(None, None)
    }

    /// Adds an anonymous vertex slot constrained to a type.
    pub fn anon_vertex_typed(self, table: &str) -> Self {
        self.push_vertex(None, Some(table))
    }

    /// Adds an anonymous, untyped edge slot.
    pub fn edge(self, direction: EdgeDirection) -> Self {
        self.push_edge(direction, None, None)
    }

    /// Adds an anonymous edge slot constrained to a type.
    pub fn edge_typed(self, direction: EdgeDirection, table: &str) -> Self {
        self.push_edge(direction, None, Some(table))
    }

    /// Adds a named, untyped edge slot.
    pub fn edge_named(self, direction: EdgeDirection, name: &str) -> Self {
        self.push_edge(direction, Some(name), None)
    }

    /// Adds a named edge slot constrained to a type.
    pub fn edge_named_typed(self, direction: EdgeDirection, name: &str, table: &str) -> Self {
        self.push_edge(direction, Some(name), Some(table))
    }

    /// Terminates the current chain; the next slot starts a new one.
    pub fn chain(mut self) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.current.is_empty() {
            self.error = Some(EngineError::Invalid("chain() called on an empty chain"));
            return self;
        }
        self.finish_chain();
        self
    }

    /// Validates and returns the accumulated chains.
    pub fn build(mut self) -> Result<Vec<PatternChain>> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if !self.current.is_empty() {
            self.finish_chain();
        }
        if self.chains.is_empty() {
            return Err(EngineError::Invalid("pattern has no chains"));
        }
        for chain in &self.chains {
            match chain.nodes.last().map(|n| n.kind) {
                Some(NodeKind::Vertex) => {}
                _ => return Err(EngineError::Invalid("pattern chain must end with a vertex")),
            }
        }
        Ok(self.chains)
    }

    fn finish_chain(&mut self) {
        let nodes = std::mem::take(&mut self.current);
        self.chains.push(PatternChain::new(nodes));
    }

    fn push_vertex(mut self, name: Option<&str>, table: Option<&str>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if matches!(self.current.last().map(|n| n.kind), Some(NodeKind::Vertex)) {
            self.error = Some(EngineError::Invalid(
                "vertex slot must follow an edge slot or start a chain",
            ));
            return self;
        }
        self.current.push(PatternNode::vertex(name, table));
        self
    }

    fn push_edge(mut self, direction: EdgeDirection, name: Option<&str>, table: Option<&str>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.current.last().map(|n| n.kind) {
            Some(NodeKind::Vertex) => {}
            _ => {
                self.error = Some(EngineError::Invalid("edge slot requires a preceding vertex"));
                return self;
            }
        }
        self.current.push(PatternNode::edge(direction, name, table));
        self
    }
}

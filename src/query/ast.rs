//! Parsed-pattern intermediate representation.
//!
//! The structures here are what the upstream pattern parser hands to the
//! compiler: flat chains of vertex and edge slots with optional variable
//! names and type names. Type names are resolved against the catalog during
//! compilation, not here.

/// Direction selector for an edge slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgeDirection {
    /// Outgoing edges of the preceding vertex.
    Out,
    /// Incoming edges of the preceding vertex.
    In,
    /// Edges in both directions.
    Both,
}

impl EdgeDirection {
    /// The direction an edge slot takes when its chain is reversed.
    pub fn flipped(self) -> Self {
        match self {
            EdgeDirection::Out => EdgeDirection::In,
            EdgeDirection::In => EdgeDirection::Out,
            EdgeDirection::Both => EdgeDirection::Both,
        }
    }
}

impl Default for EdgeDirection {
    fn default() -> Self {
        EdgeDirection::Out
    }
}

/// Whether a pattern slot stands for a vertex or an edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// A vertex slot.
    Vertex,
    /// An edge slot with its traversal direction.
    Edge(EdgeDirection),
}

impl NodeKind {
    /// Whether this slot stands for a vertex.
    pub fn is_vertex(&self) -> bool {
        matches!(self, NodeKind::Vertex)
    }
}

/// One vertex or edge slot of a parsed chain.
#[derive(Clone, Debug)]
pub struct PatternNode {
    /// Slot kind; edges carry their direction.
    pub kind: NodeKind,
    /// Variable name, `None` for an anonymous slot.
    pub name: Option<String>,
    /// Declared type name, `None` when the slot matches any type.
    pub table: Option<String>,
}

impl PatternNode {
    /// Creates a vertex slot.
    pub fn vertex(name: Option<&str>, table: Option<&str>) -> Self {
        Self {
            kind: NodeKind::Vertex,
            name: name.map(str::to_owned),
            table: table.map(str::to_owned),
        }
    }

    /// Creates an edge slot.
    pub fn edge(direction: EdgeDirection, name: Option<&str>, table: Option<&str>) -> Self {
        Self {
            kind: NodeKind::Edge(direction),
            name: name.map(str::to_owned),
            table: table.map(str::to_owned),
        }
    }

    /// The slot as it appears in a reversed chain: directions flip,
    /// everything else is unchanged.
    pub fn flipped(&self) -> Self {
        let kind = match self.kind {
            NodeKind::Vertex => NodeKind::Vertex,
            NodeKind::Edge(dir) => NodeKind::Edge(dir.flipped()),
        };
        Self {
            kind,
            name: self.name.clone(),
            table: self.table.clone(),
        }
    }
}

/// One comma-separated pattern segment: vertex, edge, vertex, ...
///
/// `split_by` is filled in by the compiler's connectivity ordering and names
/// the shared variable this chain is anchored on, if any.
#[derive(Clone, Debug, Default)]
pub struct PatternChain {
    /// Alternating vertex/edge slots, starting and ending with a vertex.
    pub nodes: Vec<PatternNode>,
    /// Shared variable chosen during ordering; `None` for group heads and
    /// unconnected chains.
    pub split_by: Option<String>,
}

impl PatternChain {
    /// Creates a chain from its slots.
    pub fn new(nodes: Vec<PatternNode>) -> Self {
        Self {
            nodes,
            split_by: None,
        }
    }

    /// Whether any slot carries the given variable name.
    pub fn mentions(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name.as_deref() == Some(name))
    }

    /// First variable name of `self` that also appears in `other`, scanning
    /// this chain's slots in order.
    pub fn shared_variable(&self, other: &PatternChain) -> Option<&str> {
        self.nodes
            .iter()
            .filter_map(|n| n.name.as_deref())
            .find(|name| other.mentions(name))
    }
}

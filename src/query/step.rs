//! Match-step predicates: one per compiled pattern position.
//!
//! Four variants cover the element kinds a position can accept. All checks
//! are applied in order and the scope is only mutated once every check has
//! passed, so a refusal leaves the scope untouched.

use crate::graph::{Dir, Element, Graph};
use crate::query::ast::EdgeDirection;
use crate::query::scope::BindingScope;
use crate::types::TableId;

/// Payload shared by all step variants.
#[derive(Clone, Debug)]
pub struct StepInfo {
    /// Scope slot of the step's variable; `None` for an anonymous slot.
    pub slot: Option<usize>,
    /// Whether this step is the first occurrence of its variable and
    /// therefore owns the binding's lifetime.
    pub first_appearance: bool,
    /// Declared type; `None` matches any table.
    pub table: Option<TableId>,
}

/// A compiled pattern position.
#[derive(Clone, Debug)]
pub enum MatchStep {
    /// Accepts vertices.
    Vertex(StepInfo),
    /// Accepts outgoing-array edge slots.
    OutEdge(StepInfo),
    /// Accepts incoming-array edge slots.
    InEdge(StepInfo),
    /// Accepts edge slots from either array.
    AnyEdge(StepInfo),
}

impl MatchStep {
    /// The step's shared payload.
    pub fn info(&self) -> &StepInfo {
        match self {
            MatchStep::Vertex(info)
            | MatchStep::OutEdge(info)
            | MatchStep::InEdge(info)
            | MatchStep::AnyEdge(info) => info,
        }
    }

    /// Whether the step occupies a vertex position.
    pub fn is_vertex(&self) -> bool {
        matches!(self, MatchStep::Vertex(_))
    }

    /// Traversal direction of an edge step; `None` for vertex steps.
    pub fn direction(&self) -> Option<EdgeDirection> {
        match self {
            MatchStep::Vertex(_) => None,
            MatchStep::OutEdge(_) => Some(EdgeDirection::Out),
            MatchStep::InEdge(_) => Some(EdgeDirection::In),
            MatchStep::AnyEdge(_) => Some(EdgeDirection::Both),
        }
    }

    fn accepts_kind(&self, candidate: Element) -> bool {
        match (self, candidate) {
            (MatchStep::Vertex(_), Element::Vertex(_)) => true,
            (MatchStep::OutEdge(_), Element::Edge(Dir::Out, _)) => true,
            (MatchStep::InEdge(_), Element::Edge(Dir::In, _)) => true,
            (MatchStep::AnyEdge(_), Element::Edge(..)) => true,
            _ => false,
        }
    }

    /// Decides whether `candidate` satisfies this position given the current
    /// bindings. Binds the step's variable on success when this is its first
    /// unbound occurrence; a refusal makes no mutation.
    pub fn apply(&self, graph: &Graph, candidate: Element, scope: &mut BindingScope) -> bool {
        if !self.accepts_kind(candidate) {
            return false;
        }
        let info = self.info();
        if let Some(table) = info.table {
            if graph.element_table(candidate) != table {
                return false;
            }
        }
        let Some(slot) = info.slot else {
            return true;
        };
        let id = graph.element_id(candidate);
        match scope.binding(slot) {
            Some(bound) => bound.id == id,
            None => {
                if scope.is_used(candidate, id) {
                    return false;
                }
                scope.bind(slot, candidate, id);
                true
            }
        }
    }

    /// Releases the binding owned by this step. Repeated-reference and
    /// anonymous steps never unset; only the first occurrence owns the
    /// binding's lifetime.
    pub fn unset(&self, scope: &mut BindingScope) {
        let info = self.info();
        if info.first_appearance {
            if let Some(slot) = info.slot {
                scope.unbind(slot);
            }
        }
    }
}

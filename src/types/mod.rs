#![forbid(unsafe_code)]

//! Core identifier newtypes and the crate-wide error type.

use std::fmt;

use crate::query::errors::CompileError;

/// Identifier of a vertex. Unique among vertices only; the edge id space may
/// reuse the same numeric values.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VertexId(pub u64);

/// Identifier of an edge. Unique among edges only.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeId(pub u64);

/// Identifier of a vertex or edge table in the [`crate::graph::Catalog`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TableId(pub u32);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TableId {
    fn from(value: u32) -> Self {
        TableId(value)
    }
}

impl From<TableId> for u32 {
    fn from(value: TableId) -> Self {
        value.0
    }
}

/// Errors surfaced by graph construction and query execution.
///
/// Search-time invariant violations are programming-contract failures and
/// panic instead of appearing here; an empty match result is not an error.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Pattern compilation rejected the query before any search started.
    #[error("pattern compilation failed: {0}")]
    Compile(#[from] CompileError),
    /// Invalid argument described by a static message.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Invalid argument carrying formatted context.
    #[error("invalid argument: {0}")]
    InvalidOwned(String),
    /// The search observed a tripped cancellation flag and stopped early.
    #[error("search cancelled")]
    Cancelled,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

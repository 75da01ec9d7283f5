#![forbid(unsafe_code)]

//! Pattern compilation and matching.
//!
//! This module turns parsed pattern chains into an executable search plan
//! and enumerates every binding of the plan against an immutable graph,
//! single-threaded or across a worker pool.

/// Parsed-pattern intermediate representation.
///
/// Chains of vertex/edge slots as handed over by the upstream parser.
pub mod ast;

/// Fluent builder for parsed pattern chains.
///
/// Programmatic stand-in for the out-of-scope text parser.
pub mod builder;

/// Pattern compiler.
///
/// Connectivity ordering, chain splitting, and step compilation.
pub mod compiler;

/// Structured compile-error taxonomy.
pub mod errors;

/// Single-thread depth-first matcher.
pub mod matcher;

/// Parallel matcher, vertex distributor, and partition merge.
pub mod parallel;

/// Compiled pattern and its search state.
pub mod pattern;

/// Columnar match-result table.
pub mod results;

/// Variable binding scope and used-element sets.
pub mod scope;

/// Match-step predicates.
pub mod step;

pub use builder::PatternBuilder;
pub use compiler::{CompilerOutput, PatternCompiler};
pub use matcher::Matcher;
pub use parallel::{ParallelConfig, ParallelMatcher, VertexDistributor};
pub use pattern::CompiledPattern;
pub use results::MatchTable;

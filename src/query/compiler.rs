//! Pattern compiler: parsed chains in, executable search plan out.
//!
//! Compilation has three passes. Connectivity ordering arranges the chains
//! so that every chain sharing a variable with an already-emitted chain
//! follows it, tagged with the shared name. Splitting cuts each tagged chain
//! at its shared variable so the search can fan out from an already-bound
//! anchor in both directions. Step compilation resolves type names and
//! variable slots and produces the match-step predicates.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;
use xxhash_rust::xxh64::Xxh64;

use crate::graph::Catalog;
use crate::query::ast::{EdgeDirection, NodeKind, PatternChain, PatternNode};
use crate::query::errors::CompileError;
use crate::query::pattern::{Chain, CompiledPattern, VariableInfo};
use crate::query::step::{MatchStep, StepInfo};
use crate::types::TableId;

/// Human-readable description of one compiled step.
#[derive(Clone, Debug, Serialize)]
pub struct StepExplain {
    /// Step kind: `vertex`, `edge-out`, `edge-in`, or `edge-any`.
    pub kind: &'static str,
    /// Variable name, absent for anonymous steps.
    pub var: Option<String>,
    /// Declared type name, absent when the step matches any type.
    pub table: Option<String>,
    /// Scope slot of the step's variable.
    pub slot: Option<usize>,
    /// Whether the step owns its variable's binding.
    pub first_appearance: bool,
}

/// Human-readable description of one compiled chain.
#[derive(Clone, Debug, Serialize)]
pub struct ChainExplain {
    /// Shared variable this chain is anchored on, if any.
    pub split_by: Option<String>,
    /// The chain's steps in search order.
    pub steps: Vec<StepExplain>,
}

/// Explain tree for a compiled pattern.
#[derive(Clone, Debug, Serialize)]
pub struct PatternExplain {
    /// Deterministic hash of the compiled structure.
    pub pattern_hash: u64,
    /// Compiled chains in search order.
    pub chains: Vec<ChainExplain>,
}

/// Compiler output: the executable pattern plus its explain tree.
#[derive(Debug)]
pub struct CompilerOutput {
    /// The compiled pattern ready to be searched.
    pub pattern: CompiledPattern,
    /// Explain tree describing the compiled chains.
    pub explain: PatternExplain,
    /// Deterministic hash, duplicated from the pattern for convenience.
    pub pattern_hash: u64,
}

/// Compiles parsed pattern chains against a catalog.
pub struct PatternCompiler<'a> {
    catalog: &'a Catalog,
}

impl<'a> PatternCompiler<'a> {
    /// Creates a compiler resolving type names against `catalog`.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Compiles the chains into an executable pattern.
    pub fn compile(
        &self,
        chains: Vec<PatternChain>,
    ) -> Result<CompilerOutput, CompileError> {
        validate(&chains)?;
        let ordered = order_by_connectivity(chains);
        let mut split = Vec::with_capacity(ordered.len());
        for chain in ordered {
            split_chain(chain, &mut split);
        }

        let mut compiler = StepCompiler::new(self.catalog);
        let mut compiled = Vec::with_capacity(split.len());
        let mut explain_chains = Vec::with_capacity(split.len());
        for chain in &split {
            let (steps, explain) = compiler.compile_chain(chain)?;
            compiled.push(Chain::new(steps));
            explain_chains.push(ChainExplain {
                split_by: chain.split_by.clone(),
                steps: explain,
            });
        }
        if compiler.variables.is_empty() {
            return Err(CompileError::NoVariables);
        }

        let pattern_hash = hash_chains(&compiled);
        debug!(
            chains = compiled.len(),
            variables = compiler.variables.len(),
            pattern_hash,
            "pattern compiled"
        );
        let pattern = CompiledPattern::new(compiled, compiler.variables, pattern_hash);
        Ok(CompilerOutput {
            pattern,
            explain: PatternExplain {
                pattern_hash,
                chains: explain_chains,
            },
            pattern_hash,
        })
    }
}

fn validate(chains: &[PatternChain]) -> Result<(), CompileError> {
    if chains.is_empty() {
        return Err(CompileError::EmptyPattern);
    }
    for (index, chain) in chains.iter().enumerate() {
        if chain.nodes.is_empty() {
            return Err(CompileError::EmptyChain { index });
        }
        if chain.nodes.len() % 2 == 0 {
            return Err(CompileError::MalformedChain {
                index,
                reason: "chain must end with a vertex slot",
            });
        }
        for (pos, node) in chain.nodes.iter().enumerate() {
            let expect_vertex = pos % 2 == 0;
            if node.kind.is_vertex() != expect_vertex {
                return Err(CompileError::MalformedChain {
                    index,
                    reason: "slots must alternate vertex, edge, vertex",
                });
            }
        }
    }
    Ok(())
}

/// Arranges chains so connected chains follow their group, tagging each
/// follower with the shared variable discovered first in row-major pair
/// order. A chain found to connect two already-used chains keeps its
/// earlier tag; later pairings never overwrite it. Chains sharing nothing
/// are appended at the end in their original order.
fn order_by_connectivity(chains: Vec<PatternChain>) -> Vec<PatternChain> {
    let n = chains.len();
    let mut used = vec![false; n];
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut split: Vec<Option<String>> = vec![None; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let Some(shared) = chains[i]
                .shared_variable(&chains[j])
                .map(str::to_owned)
            else {
                continue;
            };
            match (used[i], used[j]) {
                (false, false) => {
                    used[i] = true;
                    used[j] = true;
                    order.push(i);
                    order.push(j);
                    split[j] = Some(shared);
                }
                (true, false) => {
                    used[j] = true;
                    order.push(j);
                    split[j] = Some(shared);
                }
                (false, true) => {
                    used[i] = true;
                    order.push(i);
                    split[i] = Some(shared);
                }
                (true, true) => {}
            }
        }
    }
    for (i, connected) in used.iter().enumerate() {
        if !connected {
            order.push(i);
        }
    }
    order
        .into_iter()
        .map(|i| {
            let mut chain = chains[i].clone();
            chain.split_by = split[i].take();
            chain
        })
        .collect()
}

/// Cuts a tagged chain at its shared variable.
///
/// A tag at the last slot reverses the chain in place so the anchor becomes
/// its start. A tag in the middle extracts the prefix up to and including
/// the anchor, reversed, as a separate chain emitted first; the remainder
/// keeps its original order. Both resulting chains start at the anchor. A
/// tag at slot 0, an unmatched tag, or a tag naming an edge slot leaves the
/// chain unsplit; repeated-reference equality still connects it.
fn split_chain(chain: PatternChain, out: &mut Vec<PatternChain>) {
    let Some(name) = chain.split_by.clone() else {
        out.push(chain);
        return;
    };
    let Some(idx) = chain
        .nodes
        .iter()
        .position(|n| n.name.as_deref() == Some(name.as_str()))
    else {
        out.push(chain);
        return;
    };
    if idx == 0 || idx % 2 == 1 {
        out.push(chain);
        return;
    }
    if idx == chain.nodes.len() - 1 {
        let nodes = chain.nodes.iter().rev().map(PatternNode::flipped).collect();
        out.push(PatternChain {
            nodes,
            split_by: chain.split_by,
        });
        return;
    }
    let prefix: Vec<PatternNode> = chain.nodes[..=idx]
        .iter()
        .rev()
        .map(PatternNode::flipped)
        .collect();
    let remainder: Vec<PatternNode> = chain.nodes[idx..].to_vec();
    out.push(PatternChain {
        nodes: prefix,
        split_by: chain.split_by.clone(),
    });
    out.push(PatternChain {
        nodes: remainder,
        split_by: chain.split_by,
    });
}

struct StepCompiler<'a> {
    catalog: &'a Catalog,
    slots: FxHashMap<String, usize>,
    variables: Vec<VariableInfo>,
}

impl<'a> StepCompiler<'a> {
    fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            slots: FxHashMap::default(),
            variables: Vec::new(),
        }
    }

    fn compile_chain(
        &mut self,
        chain: &PatternChain,
    ) -> Result<(Vec<MatchStep>, Vec<StepExplain>), CompileError> {
        let mut steps = Vec::with_capacity(chain.nodes.len());
        let mut explain = Vec::with_capacity(chain.nodes.len());
        for node in &chain.nodes {
            let table = self.resolve_table(node)?;
            let (slot, first_appearance) = self.resolve_slot(node, table)?;
            let info = StepInfo {
                slot,
                first_appearance,
                table,
            };
            let step = match node.kind {
                NodeKind::Vertex => MatchStep::Vertex(info),
                NodeKind::Edge(EdgeDirection::Out) => MatchStep::OutEdge(info),
                NodeKind::Edge(EdgeDirection::In) => MatchStep::InEdge(info),
                NodeKind::Edge(EdgeDirection::Both) => MatchStep::AnyEdge(info),
            };
            explain.push(StepExplain {
                kind: match &step {
                    MatchStep::Vertex(_) => "vertex",
                    MatchStep::OutEdge(_) => "edge-out",
                    MatchStep::InEdge(_) => "edge-in",
                    MatchStep::AnyEdge(_) => "edge-any",
                },
                var: node.name.clone(),
                table: node.table.clone(),
                slot,
                first_appearance,
            });
            steps.push(step);
        }
        Ok((steps, explain))
    }

    fn resolve_table(&self, node: &PatternNode) -> Result<Option<TableId>, CompileError> {
        let Some(name) = node.table.as_deref() else {
            return Ok(None);
        };
        let resolved = if node.kind.is_vertex() {
            self.catalog.vertex_table(name)
        } else {
            self.catalog.edge_table(name)
        };
        match resolved {
            Some(id) => Ok(Some(id)),
            None if node.kind.is_vertex() => Err(CompileError::UnknownVertexType {
                name: name.to_owned(),
            }),
            None => Err(CompileError::UnknownEdgeType {
                name: name.to_owned(),
            }),
        }
    }

    fn resolve_slot(
        &mut self,
        node: &PatternNode,
        table: Option<TableId>,
    ) -> Result<(Option<usize>, bool), CompileError> {
        let Some(name) = node.name.as_deref() else {
            return Ok((None, false));
        };
        if let Some(&slot) = self.slots.get(name) {
            let existing = &mut self.variables[slot];
            if existing.is_vertex != node.kind.is_vertex() {
                return Err(CompileError::KindConflict {
                    var: name.to_owned(),
                });
            }
            match (existing.table, table) {
                (Some(first), Some(second)) if first != second => {
                    return Err(CompileError::TypeConflict {
                        var: name.to_owned(),
                        first: self.catalog.table(first).name.clone(),
                        second: self.catalog.table(second).name.clone(),
                    });
                }
                (None, Some(declared)) => existing.table = Some(declared),
                _ => {}
            }
            return Ok((Some(slot), false));
        }
        let slot = self.variables.len();
        self.slots.insert(name.to_owned(), slot);
        self.variables.push(VariableInfo {
            name: name.to_owned(),
            slot,
            is_vertex: node.kind.is_vertex(),
            table,
        });
        Ok((Some(slot), true))
    }
}

fn hash_chains(chains: &[Chain]) -> u64 {
    let mut hasher = Xxh64::new(0);
    hasher.update(&(chains.len() as u64).to_le_bytes());
    for chain in chains {
        hasher.update(&(chain.len() as u64).to_le_bytes());
        for pos in 0..chain.len() {
            let step = chain.step(pos);
            let kind: u8 = match step {
                MatchStep::Vertex(_) => 0,
                MatchStep::OutEdge(_) => 1,
                MatchStep::InEdge(_) => 2,
                MatchStep::AnyEdge(_) => 3,
            };
            let info = step.info();
            hasher.update(&[kind, u8::from(info.first_appearance)]);
            hasher.update(&info.slot.map_or(u64::MAX, |s| s as u64).to_le_bytes());
            hasher.update(&info.table.map_or(u32::MAX, |t| t.0).to_le_bytes());
        }
    }
    hasher.digest()
}

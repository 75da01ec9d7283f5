//! Compiled pattern: immutable chain structure plus the mutable search
//! cursor, binding scope, and scratch row the matcher drives.
//!
//! The chain structure is shared between clones; everything mutable is
//! per-clone, which is what lets each parallel worker search independently.

use std::sync::Arc;

use crate::graph::{Element, Graph};
use crate::query::scope::{Binding, BindingScope};
use crate::query::step::MatchStep;
use crate::types::TableId;

/// One compiled chain: alternating vertex/edge steps, vertex first and last.
#[derive(Debug)]
pub struct Chain {
    steps: Vec<MatchStep>,
}

impl Chain {
    pub(crate) fn new(steps: Vec<MatchStep>) -> Self {
        debug_assert!(steps.len() % 2 == 1, "chain must end on a vertex step");
        Self { steps }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain has no steps. Compiled chains never are.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step at a position.
    pub fn step(&self, position: usize) -> &MatchStep {
        &self.steps[position]
    }
}

/// A named variable of the compiled pattern.
#[derive(Clone, Debug)]
pub struct VariableInfo {
    /// Variable name as written in the pattern.
    pub name: String,
    /// Scope slot, assigned in first-appearance order.
    pub slot: usize,
    /// Whether the variable names vertices (as opposed to edges).
    pub is_vertex: bool,
    /// Type recorded at the variable's first typed occurrence, if any.
    pub table: Option<TableId>,
}

/// The compiled pattern and its search state.
///
/// The matcher owns exactly one of these per worker and mutates the cursor,
/// scope, and scratch row as it advances and retreats.
#[derive(Debug)]
pub struct CompiledPattern {
    chains: Arc<[Chain]>,
    offsets: Arc<[usize]>,
    variables: Arc<[VariableInfo]>,
    pattern_hash: u64,
    chain_idx: usize,
    position: usize,
    scope: BindingScope,
    scratch: Vec<Option<Element>>,
}

impl CompiledPattern {
    pub(crate) fn new(chains: Vec<Chain>, variables: Vec<VariableInfo>, pattern_hash: u64) -> Self {
        let mut offsets = Vec::with_capacity(chains.len());
        let mut total = 0usize;
        for chain in &chains {
            offsets.push(total);
            total += chain.len();
        }
        let slot_count = variables.len();
        Self {
            chains: chains.into(),
            offsets: offsets.into(),
            variables: variables.into(),
            pattern_hash,
            chain_idx: 0,
            position: 0,
            scope: BindingScope::new(slot_count),
            scratch: vec![None; total],
        }
    }

    /// A clone sharing the immutable chain structure but with a fresh
    /// cursor, scope, used-sets, and scratch row.
    pub fn clone_fresh(&self) -> Self {
        Self {
            chains: Arc::clone(&self.chains),
            offsets: Arc::clone(&self.offsets),
            variables: Arc::clone(&self.variables),
            pattern_hash: self.pattern_hash,
            chain_idx: 0,
            position: 0,
            scope: BindingScope::new(self.variables.len()),
            scratch: vec![None; self.scratch.len()],
        }
    }

    /// Deterministic hash of the compiled chain structure.
    pub fn pattern_hash(&self) -> u64 {
        self.pattern_hash
    }

    /// The pattern's named variables, in slot order.
    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    /// Number of variable slots (and result columns).
    pub fn slot_count(&self) -> usize {
        self.variables.len()
    }

    /// Number of compiled chains.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// The compiled chains.
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    // --- cursor -----------------------------------------------------------

    pub(crate) fn chain_index(&self) -> usize {
        self.chain_idx
    }

    pub(crate) fn current_chain(&self) -> &Chain {
        &self.chains[self.chain_idx]
    }

    pub(crate) fn current_step(&self) -> &MatchStep {
        self.current_chain().step(self.position)
    }

    /// Flat position across all chains; indexes the scratch row.
    pub(crate) fn overall_index(&self) -> usize {
        self.offsets[self.chain_idx] + self.position
    }

    pub(crate) fn at_vertex_position(&self) -> bool {
        self.position % 2 == 0
    }

    pub(crate) fn at_chain_start(&self) -> bool {
        self.position == 0
    }

    pub(crate) fn at_chain_end(&self) -> bool {
        self.position + 1 == self.current_chain().len()
    }

    pub(crate) fn at_last_chain(&self) -> bool {
        self.chain_idx + 1 == self.chains.len()
    }

    pub(crate) fn advance(&mut self) {
        debug_assert!(!self.at_chain_end());
        self.position += 1;
    }

    /// Steps back one position, releasing the binding owned by the position
    /// being left.
    pub(crate) fn retreat(&mut self) {
        debug_assert!(!self.at_chain_start());
        self.unset_current();
        self.position -= 1;
    }

    /// Moves the cursor to the start of the next chain.
    pub(crate) fn next_chain(&mut self) {
        debug_assert!(!self.at_last_chain());
        self.chain_idx += 1;
        self.position = 0;
    }

    /// Moves the cursor back to the last position of the previous chain.
    pub(crate) fn prev_chain(&mut self) {
        debug_assert!(self.chain_idx > 0);
        self.chain_idx -= 1;
        self.position = self.current_chain().len() - 1;
    }

    // --- predicates and bindings -----------------------------------------

    pub(crate) fn apply_current(&mut self, graph: &Graph, candidate: Element) -> bool {
        self.chains[self.chain_idx]
            .step(self.position)
            .apply(graph, candidate, &mut self.scope)
    }

    pub(crate) fn unset_current(&mut self) {
        self.chains[self.chain_idx]
            .step(self.position)
            .unset(&mut self.scope);
    }

    /// The already-bound element anchoring the current chain's head, if its
    /// first step names a bound variable. `None` signals that the chain has
    /// no external anchor and must start from a fresh graph scan.
    pub(crate) fn connector(&self) -> Option<Element> {
        let head = self.current_chain().step(0);
        let slot = head.info().slot?;
        self.scope.binding(slot).map(|b| b.element)
    }

    pub(crate) fn binding(&self, slot: usize) -> Option<Binding> {
        self.scope.binding(slot)
    }

    // --- scratch row ------------------------------------------------------

    pub(crate) fn set_scratch(&mut self, element: Option<Element>) {
        let idx = self.overall_index();
        self.scratch[idx] = element;
    }

    /// Clears and returns the scratch cell at the cursor.
    pub(crate) fn take_scratch(&mut self) -> Option<Element> {
        let idx = self.overall_index();
        self.scratch[idx].take()
    }

    /// Scratch cell one position before the cursor, i.e. the vertex an edge
    /// position fans out from.
    pub(crate) fn scratch_before(&self) -> Option<Element> {
        self.scratch[self.overall_index() - 1]
    }

    /// Resets cursor, scope, used-sets, and scratch for a re-run.
    pub fn reset(&mut self) {
        self.chain_idx = 0;
        self.position = 0;
        self.scope.clear();
        self.scratch.iter_mut().for_each(|cell| *cell = None);
    }
}

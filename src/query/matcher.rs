//! Single-thread depth-first matcher.
//!
//! The search is an explicit backtracking state machine: cursor, bindings,
//! and the scratch row all live in the [`CompiledPattern`], and forward and
//! backward moves are plain field mutations. Nothing recurses, so chain
//! length never threatens the call stack, and a worker can be driven over
//! arbitrary vertex ranges.
//!
//! Chain 0 is driven by candidate root vertices from the caller's range.
//! Every later chain starts from its connector when one is bound, and from
//! a fresh scan over the whole vertex array when it has none (the head of a
//! new conjunction). Edges of a vertex are tried in increasing array
//! position starting at the vertex's span, with the scratch cell as the
//! resume cursor, so every candidate edge is visited exactly once per
//! vertex activation.

use smallvec::SmallVec;

use crate::graph::{Dir, Element, Graph};
use crate::query::ast::EdgeDirection;
use crate::query::pattern::CompiledPattern;
use crate::query::results::MatchTable;

enum ChainOutcome {
    /// Every position of the current chain holds a binding.
    Filled,
    /// The chain has no (further) way to match; all its bindings are
    /// released and the cursor is back at its start.
    Emptied,
}

/// Depth-first matcher owning one search state and one result partition.
pub struct Matcher<'g> {
    graph: &'g Graph,
    pattern: CompiledPattern,
    results: MatchTable,
    scan: Vec<usize>,
}

impl<'g> Matcher<'g> {
    /// Creates a matcher with a fresh clone of the compiled pattern and an
    /// empty result partition.
    pub fn new(graph: &'g Graph, pattern: &CompiledPattern) -> Self {
        let pattern = pattern.clone_fresh();
        let results = MatchTable::new(pattern.slot_count());
        let scan = vec![0; pattern.chain_count()];
        Self {
            graph,
            pattern,
            results,
            scan,
        }
    }

    /// Searches every vertex as a chain-0 root.
    pub fn run_all(&mut self) {
        self.run_range(0, self.graph.vertex_count());
    }

    /// Searches chain-0 roots drawn from the half-open range `[start, end)`
    /// of the vertex array.
    pub fn run_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.graph.vertex_count());
        for root in start..end {
            self.search_root(root as u32);
        }
    }

    /// The rows found so far.
    pub fn results(&self) -> &MatchTable {
        &self.results
    }

    /// Consumes the matcher, returning its result partition.
    pub fn into_results(self) -> MatchTable {
        self.results
    }

    /// Runs the full conjunction walk for one chain-0 root vertex.
    fn search_root(&mut self, root: u32) {
        debug_assert_eq!(self.pattern.chain_index(), 0, "root search mid-pattern");
        let mut entry: Option<Element> = Some(Element::Vertex(root));
        loop {
            let outcome = match entry.take() {
                Some(element) => self.fill_chain(element),
                None => self.resume_chain(),
            };
            match outcome {
                ChainOutcome::Filled => {
                    self.pattern.next_chain();
                    match self.pattern.connector() {
                        Some(anchor) => entry = Some(anchor),
                        None => {
                            let chain = self.pattern.chain_index();
                            self.scan[chain] = 0;
                            match self.scan_vertex(chain) {
                                Some(vertex) => entry = Some(vertex),
                                None => {
                                    self.pattern.prev_chain();
                                }
                            }
                        }
                    }
                }
                ChainOutcome::Emptied => {
                    let chain = self.pattern.chain_index();
                    if chain == 0 {
                        return;
                    }
                    if self.pattern.connector().is_none() {
                        self.scan[chain] += 1;
                        if let Some(vertex) = self.scan_vertex(chain) {
                            entry = Some(vertex);
                            continue;
                        }
                    }
                    self.pattern.prev_chain();
                }
            }
        }
    }

    fn scan_vertex(&self, chain: usize) -> Option<Element> {
        let index = self.scan[chain];
        (index < self.graph.vertex_count()).then(|| Element::Vertex(index as u32))
    }

    fn fill_chain(&mut self, entry: Element) -> ChainOutcome {
        debug_assert!(self.pattern.at_chain_start());
        self.step_loop(Some(entry))
    }

    fn resume_chain(&mut self) -> ChainOutcome {
        debug_assert!(self.pattern.at_chain_end());
        self.step_loop(None)
    }

    /// Drives the current chain until it is either filled or emptied.
    fn step_loop(&mut self, mut candidate: Option<Element>) -> ChainOutcome {
        loop {
            if let Some(element) = candidate {
                if self.pattern.apply_current(self.graph, element) {
                    self.pattern.set_scratch(Some(element));
                    if self.pattern.at_chain_end() {
                        if self.pattern.at_last_chain() {
                            self.emit_row();
                            // Simulated failure: retreat to find the next row.
                            candidate = None;
                            continue;
                        }
                        return ChainOutcome::Filled;
                    }
                    self.pattern.advance();
                    candidate = self.first_candidate(element);
                    continue;
                }
            }
            match self.backward(candidate.take()) {
                Some(next) => candidate = Some(next),
                None => return ChainOutcome::Emptied,
            }
        }
    }

    /// Forward move: the first candidate for the position just entered.
    fn first_candidate(&mut self, previous: Element) -> Option<Element> {
        if self.pattern.at_vertex_position() {
            match previous {
                Element::Edge(dir, pos) => {
                    Some(Element::Vertex(self.graph.edge(dir, pos).endpoint))
                }
                Element::Vertex(_) => unreachable!("vertex position entered from a vertex"),
            }
        } else {
            match previous {
                Element::Vertex(origin) => self.next_edge(origin, None),
                Element::Edge(..) => unreachable!("edge position entered from an edge"),
            }
        }
    }

    /// Backward move: releases the failed position and produces the next
    /// untried candidate, or `None` once retreat passes the chain start.
    fn backward(&mut self, mut failed: Option<Element>) -> Option<Element> {
        loop {
            if self.pattern.at_vertex_position() {
                self.pattern.set_scratch(None);
                if self.pattern.at_chain_start() {
                    self.pattern.unset_current();
                    return None;
                }
                self.pattern.retreat();
                failed = None;
            } else {
                // The exclusion cursor is the candidate that just failed, or
                // the previously bound edge recorded in the scratch cell.
                let cursor = match failed.take() {
                    Some(element) => Some(element),
                    None => {
                        let previous = self.pattern.take_scratch();
                        if previous.is_some() {
                            self.pattern.unset_current();
                        }
                        previous
                    }
                };
                let origin = match self.pattern.scratch_before() {
                    Some(Element::Vertex(pos)) => pos,
                    other => unreachable!("edge step without a bound origin: {other:?}"),
                };
                match self.next_edge(origin, cursor) {
                    Some(edge) => return Some(edge),
                    None => {
                        self.pattern.retreat();
                    }
                }
            }
        }
    }

    /// Next edge of `origin` for the current edge step, strictly after the
    /// exclusion cursor. Any-direction steps exhaust the incoming array
    /// before starting on the outgoing one.
    fn next_edge(&self, origin: u32, after: Option<Element>) -> Option<Element> {
        let Some(direction) = self.pattern.current_step().direction() else {
            unreachable!("edge enumeration at a vertex step");
        };
        match direction {
            EdgeDirection::Out => {
                let after = match after {
                    None => None,
                    Some(Element::Edge(Dir::Out, pos)) => Some(pos),
                    Some(other) => unreachable!("out-edge cursor held {other:?}"),
                };
                self.next_in_span(origin, Dir::Out, after)
            }
            EdgeDirection::In => {
                let after = match after {
                    None => None,
                    Some(Element::Edge(Dir::In, pos)) => Some(pos),
                    Some(other) => unreachable!("in-edge cursor held {other:?}"),
                };
                self.next_in_span(origin, Dir::In, after)
            }
            EdgeDirection::Both => match after {
                None => self
                    .next_in_span(origin, Dir::In, None)
                    .or_else(|| self.next_in_span(origin, Dir::Out, None)),
                Some(Element::Edge(Dir::In, pos)) => self
                    .next_in_span(origin, Dir::In, Some(pos))
                    .or_else(|| self.next_in_span(origin, Dir::Out, None)),
                Some(Element::Edge(Dir::Out, pos)) => {
                    self.next_in_span(origin, Dir::Out, Some(pos))
                }
                Some(Element::Vertex(_)) => unreachable!("edge cursor holds a vertex"),
            },
        }
    }

    fn next_in_span(&self, origin: u32, dir: Dir, after: Option<u32>) -> Option<Element> {
        let span = self.graph.span(origin, dir)?;
        let next = match after {
            None => span.start,
            Some(pos) => pos + 1,
        };
        (next < span.end).then_some(Element::Edge(dir, next))
    }

    /// Appends the current bindings, in slot order, as one result row.
    fn emit_row(&mut self) {
        let mut row: SmallVec<[Element; 8]> = SmallVec::with_capacity(self.pattern.slot_count());
        for slot in 0..self.pattern.slot_count() {
            match self.pattern.binding(slot) {
                Some(binding) => row.push(binding.element),
                None => unreachable!("complete match left slot {slot} unbound"),
            }
        }
        self.results.push_row(&row);
    }
}

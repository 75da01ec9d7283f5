//! Variable binding scope shared by the match-step predicates.
//!
//! One slot per distinct variable name, assigned in first-appearance order,
//! plus two id-keyed used-element sets. Two sets are required because vertex
//! ids and edge ids are not mutually unique: a vertex and an edge may carry
//! the same numeric id without being the same element.

use rustc_hash::FxHashSet;

use crate::graph::Element;

/// A slot's current binding: the element handle plus its cached id.
///
/// The id is cached so that repeated-occurrence checks compare ids without
/// another graph lookup; handles for the same logical edge can differ.
#[derive(Copy, Clone, Debug)]
pub struct Binding {
    /// The bound element.
    pub element: Element,
    /// The element's id within its own id space.
    pub id: u64,
}

/// Slot-indexed variable bindings and the used-element sets.
#[derive(Debug)]
pub struct BindingScope {
    slots: Vec<Option<Binding>>,
    used_vertices: FxHashSet<u64>,
    used_edges: FxHashSet<u64>,
}

impl BindingScope {
    /// Creates a scope with the given number of variable slots, all unbound.
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
            used_vertices: FxHashSet::default(),
            used_edges: FxHashSet::default(),
        }
    }

    /// Number of variable slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Current binding of a slot, if any.
    pub fn binding(&self, slot: usize) -> Option<Binding> {
        self.slots[slot]
    }

    /// Whether an element id is already claimed by some variable of the
    /// matching kind.
    pub fn is_used(&self, element: Element, id: u64) -> bool {
        match element {
            Element::Vertex(_) => self.used_vertices.contains(&id),
            Element::Edge(..) => self.used_edges.contains(&id),
        }
    }

    /// Binds a slot and claims the element's id.
    ///
    /// The slot must be unbound and the id unclaimed; predicates check both
    /// before mutating.
    pub fn bind(&mut self, slot: usize, element: Element, id: u64) {
        debug_assert!(self.slots[slot].is_none(), "slot {slot} already bound");
        let inserted = match element {
            Element::Vertex(_) => self.used_vertices.insert(id),
            Element::Edge(..) => self.used_edges.insert(id),
        };
        debug_assert!(inserted, "element id {id} already in use");
        self.slots[slot] = Some(Binding { element, id });
    }

    /// Releases a slot's binding and its used-set claim. No-op when unbound.
    pub fn unbind(&mut self, slot: usize) {
        if let Some(binding) = self.slots[slot].take() {
            match binding.element {
                Element::Vertex(_) => self.used_vertices.remove(&binding.id),
                Element::Edge(..) => self.used_edges.remove(&binding.id),
            };
        }
    }

    /// Clears every binding and both used-sets.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.used_vertices.clear();
        self.used_edges.clear();
    }
}

//! Best-first frontier plus the visited set.
//!
//! The visited set holds full composite states, turn counter included. Because every action
//! costs exactly one turn, two paths reaching an equal state always have equal cost, so marking
//! states visited when they are pushed never discards a cheaper path.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};
use std::rc::Rc;

use super::node::{FrontierKey, NodeId};
use crate::state::CompositeState;

#[derive(Debug)]
struct FrontierEntry {
    key: Reverse<FrontierKey>,
    node: NodeId,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

#[derive(Debug, Default)]
pub struct BestFirstFrontier {
    heap: BinaryHeap<FrontierEntry>,
    visited: BTreeSet<Rc<CompositeState>>,
    high_water: usize,
}

impl BestFirstFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `node` unless `state` was already seen. Returns whether it was queued.
    pub fn push(&mut self, key: FrontierKey, node: NodeId, state: &Rc<CompositeState>) -> bool {
        if !self.visited.insert(Rc::clone(state)) {
            return false;
        }
        self.heap.push(FrontierEntry { key: Reverse(key), node });
        self.high_water = self.high_water.max(self.heap.len());
        true
    }

    pub fn pop(&mut self) -> Option<(FrontierKey, NodeId)> {
        self.heap.pop().map(|entry| (entry.key.0, entry.node))
    }

    pub fn is_visited(&self, state: &CompositeState) -> bool {
        self.visited.contains(state)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

//! Search tree storage. Nodes live in a slot arena and point at their parent, so every path
//! shares its ancestors and a solution is rebuilt by walking parent links.

use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

use crate::state::CompositeState;
use crate::types::{ActionKind, ActionSequence};

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: Rc<CompositeState>,
    pub parent: Option<NodeId>,
    /// Action that produced this node from its parent; `None` only for the root.
    pub action: Option<ActionKind>,
    /// Accumulated cost: one per applied action.
    pub g: u32,
}

/// Ordering key for the frontier, lowest first: estimated total, then accumulated cost, then
/// discovery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrontierKey {
    pub f: u32,
    pub g: u32,
    pub creation_order: u64,
}

#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: SlotMap<NodeId, SearchNode>,
}

impl NodeArena {
    pub fn insert(&mut self, node: SearchNode) -> NodeId {
        self.nodes.insert(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id)
    }

    /// Actions from the root down to `id`.
    pub fn actions_to(&self, id: NodeId) -> ActionSequence {
        let mut actions = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor.and_then(|id| self.nodes.get(id)) {
            if let Some(action) = node.action {
                actions.push(action);
            }
            cursor = node.parent;
        }
        actions.reverse();
        actions
    }
}

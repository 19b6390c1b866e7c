//! Best-first search over composite states.
//! This module exists to answer "is there an action sequence that reaches the goal" by exhaustive,
//! deterministic A* expansion through the transition function. It does not own any game rules.
//!
//! Budgets are checked once per dequeued node. Running out of budget is reported as
//! [`SearchOutcome::Exhausted`], which is never a proof of unsolvability.

use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::sim::{Stage, apply, manhattan};
use crate::state::CompositeState;
use crate::types::ActionSequence;

pub mod frontier;
pub mod node;

use frontier::BestFirstFrontier;
use node::{FrontierKey, NodeArena, SearchNode};

#[cfg(test)]
mod tests;

/// Heuristic cost of one uncollected required item: the `pickup` it will take.
pub const ITEM_COST: u32 = 1;
pub const MIN_AUTO_NODE_BUDGET: u64 = 20_000;
pub const MAX_AUTO_NODE_BUDGET: u64 = 400_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Hard cap on dequeued nodes.
    pub max_expansions: u64,
    pub time_budget: Option<Duration>,
}

impl SearchPolicy {
    /// Node budget scaled by board area and enemy count, no wall-clock limit.
    pub fn auto(stage: &Stage) -> Self {
        Self { max_expansions: auto_node_budget(stage), time_budget: None }
    }

    pub fn with_max_expansions(max_expansions: u64) -> Self {
        Self { max_expansions, time_budget: None }
    }
}

pub fn auto_node_budget(stage: &Stage) -> u64 {
    let cells = stage.board().cell_count() as u64;
    let enemies = stage.initial_state().living_enemies().count() as u64;
    cells
        .saturating_mul(4)
        .saturating_mul(1 + enemies)
        .saturating_mul(64)
        .clamp(MIN_AUTO_NODE_BUDGET, MAX_AUTO_NODE_BUDGET)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLimit {
    Nodes,
    Time,
}

impl std::fmt::Display for BudgetLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BudgetLimit::Nodes => "node",
            BudgetLimit::Time => "time",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(ActionSequence),
    /// Every reachable state within the turn budget was expanded without reaching the goal.
    Unsolvable,
    Exhausted { limit: BudgetLimit },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub expanded: u64,
    pub generated: u64,
    pub duplicates: u64,
    /// Successors cut off by player defeat or the turn budget.
    pub terminal: u64,
    pub high_water: usize,
    /// Distinct states recorded as seen when the search stopped.
    pub visited: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub stats: SearchStats,
}

/// Admissible lower bound on the remaining action count.
pub fn heuristic(stage: &Stage, state: &CompositeState) -> u32 {
    let items = u32::try_from(stage.uncollected_required(state)).unwrap_or(u32::MAX);
    manhattan(state.player.pos, stage.goal()).saturating_add(ITEM_COST.saturating_mul(items))
}

/// Convenience entry point with the auto-scaled policy. `None` covers both a proven dead end
/// and an exhausted budget; use [`search_with_policy`] to tell them apart.
pub fn search(initial: &CompositeState, stage: &Stage) -> Option<ActionSequence> {
    match search_with_policy(initial, stage, &SearchPolicy::auto(stage)).outcome {
        SearchOutcome::Found(actions) => Some(actions),
        SearchOutcome::Unsolvable | SearchOutcome::Exhausted { .. } => None,
    }
}

pub fn search_with_policy(
    initial: &CompositeState,
    stage: &Stage,
    policy: &SearchPolicy,
) -> SearchReport {
    let started = Instant::now();
    let mut arena = NodeArena::default();
    let mut frontier = BestFirstFrontier::new();
    let mut stats = SearchStats::default();
    let mut creation_order = 0_u64;

    log::debug!(
        "search start: budget {} nodes, time budget {:?}",
        policy.max_expansions,
        policy.time_budget
    );

    let root_state = Rc::new(initial.clone());
    let root =
        arena.insert(SearchNode { state: Rc::clone(&root_state), parent: None, action: None, g: 0 });
    let root_key = FrontierKey { f: heuristic(stage, initial), g: 0, creation_order };
    frontier.push(root_key, root, &root_state);
    creation_order += 1;

    let outcome = loop {
        if frontier.is_empty() {
            break SearchOutcome::Unsolvable;
        }
        if stats.expanded >= policy.max_expansions {
            break SearchOutcome::Exhausted { limit: BudgetLimit::Nodes };
        }
        if let Some(limit) = policy.time_budget
            && started.elapsed() >= limit
        {
            break SearchOutcome::Exhausted { limit: BudgetLimit::Time };
        }
        let Some((_, id)) = frontier.pop() else {
            break SearchOutcome::Unsolvable;
        };
        let Some(node) = arena.get(id) else {
            continue;
        };
        stats.expanded += 1;

        if stage.is_goal(&node.state) {
            break SearchOutcome::Found(arena.actions_to(id));
        }

        let state = Rc::clone(&node.state);
        let g = node.g + 1;
        for action in stage.allowed_actions().iter().copied() {
            let transition = match apply(stage, &state, action) {
                Ok(transition) => transition,
                Err(_) => {
                    stats.terminal += 1;
                    continue;
                }
            };
            stats.generated += 1;
            if frontier.is_visited(&transition.state) {
                stats.duplicates += 1;
                continue;
            }
            let key = FrontierKey {
                f: g.saturating_add(heuristic(stage, &transition.state)),
                g,
                creation_order,
            };
            creation_order += 1;
            let child_state = Rc::new(transition.state);
            let child = arena.insert(SearchNode {
                state: Rc::clone(&child_state),
                parent: Some(id),
                action: Some(action),
                g,
            });
            frontier.push(key, child, &child_state);
        }
    };

    stats.high_water = frontier.high_water();
    stats.visited = frontier.visited_count();
    match &outcome {
        SearchOutcome::Found(actions) => log::debug!(
            "search found {} action(s) after {} expansion(s)",
            actions.len(),
            stats.expanded
        ),
        SearchOutcome::Unsolvable => {
            log::debug!("search proved no solution after {} expansion(s)", stats.expanded)
        }
        SearchOutcome::Exhausted { limit } => {
            log::debug!("search exhausted {limit:?} budget after {} expansion(s)", stats.expanded)
        }
    }
    SearchReport { outcome, stats }
}

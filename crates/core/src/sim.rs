//! Compiled stage and the per-turn transition function.
//!
//! `apply` is the single source of truth for turn resolution. The search engine, the patrol
//! strategies and replay all advance states through it, so they can never disagree about an
//! outcome. Each call runs the fixed tick order:
//!
//! 1. resolve the player action,
//! 2. advance every enemy once in declaration order,
//! 3. recompute every enemy's vision and alert flag,
//! 4. resolve counterattacks from alert adjacent enemies,
//! 5. increment the turn counter and enforce the turn budget,
//! 6. run the goal test.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::board::Board;
use crate::config::StageConfiguration;
use crate::error::StageError;
use crate::prevalidate::check_structure;
use crate::state::CompositeState;
use crate::types::{ActionKind, EnemyBehavior, EnemyId, ItemId, Pos};

mod combat;
mod enemies;
pub mod movement;
mod vision;

#[cfg(test)]
pub(crate) mod test_support;

pub use combat::attacks_required;
pub use enemies::cycle_poses;
pub use movement::manhattan;
pub use vision::can_see;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageItem {
    pub pos: Pos,
    pub required: bool,
}

/// Immutable, structurally valid stage ready for simulation.
#[derive(Clone, Debug)]
pub struct Stage {
    config: StageConfiguration,
    board: Board,
    goal: Pos,
    allowed: BTreeSet<ActionKind>,
    enemy_order: Vec<EnemyId>,
    items: BTreeMap<ItemId, StageItem>,
    max_turns: u32,
    require_all_enemies_defeated: bool,
}

impl Stage {
    /// Runs the structural pre-validator and builds the stage only when it reports nothing.
    pub fn compile(config: &StageConfiguration) -> Result<Self, StageError> {
        let issues = check_structure(config);
        if !issues.is_empty() {
            return Err(StageError::Structural(issues));
        }

        let items = config
            .items
            .iter()
            .map(|item| (item.id.clone(), StageItem { pos: item.pos(), required: item.required }))
            .collect();

        Ok(Self {
            config: config.clone(),
            board: Board::from_config(&config.board),
            goal: config.goal.pos(),
            allowed: config.allowed_actions.iter().copied().collect(),
            enemy_order: config.enemies.iter().map(|enemy| enemy.id.clone()).collect(),
            items,
            max_turns: config.max_turns,
            require_all_enemies_defeated: config.goal.require_all_enemies_defeated,
        })
    }

    pub fn config(&self) -> &StageConfiguration {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn goal(&self) -> Pos {
        self.goal
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn allowed_actions(&self) -> &BTreeSet<ActionKind> {
        &self.allowed
    }

    pub fn allows(&self, action: ActionKind) -> bool {
        self.allowed.contains(&action)
    }

    /// Enemy ids in declaration order, which is also the per-tick advance order.
    pub fn enemy_order(&self) -> &[EnemyId] {
        &self.enemy_order
    }

    pub fn items(&self) -> &BTreeMap<ItemId, StageItem> {
        &self.items
    }

    pub fn required_items(&self) -> impl Iterator<Item = (&ItemId, &StageItem)> {
        self.items.iter().filter(|(_, item)| item.required)
    }

    pub fn requires_all_enemies_defeated(&self) -> bool {
        self.require_all_enemies_defeated
    }

    pub fn has_patrols(&self) -> bool {
        self.config.enemies.iter().any(|enemy| enemy.behavior == EnemyBehavior::Patrol)
    }

    pub fn initial_state(&self) -> CompositeState {
        CompositeState::initial(&self.config)
    }

    pub fn uncollected_required(&self, state: &CompositeState) -> usize {
        self.required_items().filter(|(id, _)| !state.collected.contains(*id)).count()
    }

    pub fn is_goal(&self, state: &CompositeState) -> bool {
        state.player.pos == self.goal
            && state.player.hp > 0
            && (!self.require_all_enemies_defeated || state.all_enemies_defeated())
            && self.uncollected_required(state) == 0
    }

    fn uncollected_item_at(&self, state: &CompositeState, pos: Pos) -> Option<ItemId> {
        self.items
            .iter()
            .find(|(id, item)| item.pos == pos && !state.collected.contains(*id))
            .map(|(id, _)| id.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    InProgress,
    GoalReached,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: CompositeState,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("action `{0}` is not in the stage's allowed actions")]
    IllegalAction(ActionKind),
    #[error("player was defeated on turn {turn}")]
    PlayerDefeated { turn: u32 },
    #[error("turn {turn} exceeds the stage budget of {max_turns} turns")]
    TurnBudgetExceeded { turn: u32, max_turns: u32 },
}

impl TransitionError {
    /// Illegal actions are caller mistakes; the other variants are terminal game outcomes.
    pub fn is_illegal(&self) -> bool {
        matches!(self, TransitionError::IllegalAction(_))
    }
}

/// Advances `state` by one player action. The input state is never modified.
pub fn apply(
    stage: &Stage,
    state: &CompositeState,
    action: ActionKind,
) -> Result<Transition, TransitionError> {
    if !stage.allows(action) {
        return Err(TransitionError::IllegalAction(action));
    }
    if state.player.hp == 0 {
        return Err(TransitionError::PlayerDefeated { turn: state.turn });
    }

    let mut next = state.clone();
    resolve_player_action(stage, &mut next, action);
    enemies::advance_enemies(stage, &mut next);
    vision::refresh_alerts(stage, &mut next);
    combat::resolve_counterattacks(stage, &mut next);

    next.turn += 1;
    if next.player.hp == 0 {
        return Err(TransitionError::PlayerDefeated { turn: next.turn });
    }
    if next.turn > stage.max_turns {
        return Err(TransitionError::TurnBudgetExceeded {
            turn: next.turn,
            max_turns: stage.max_turns,
        });
    }

    let status =
        if stage.is_goal(&next) { StepStatus::GoalReached } else { StepStatus::InProgress };
    Ok(Transition { state: next, status })
}

fn resolve_player_action(stage: &Stage, state: &mut CompositeState, action: ActionKind) {
    match action {
        ActionKind::TurnLeft => state.player.facing = state.player.facing.turn_left(),
        ActionKind::TurnRight => state.player.facing = state.player.facing.turn_right(),
        ActionKind::Move => {
            let dest = state.player.pos.step(state.player.facing);
            if movement::is_open_for_player(stage.board(), state, dest) {
                state.player.pos = dest;
            }
        }
        ActionKind::Attack => {
            if let Some(defeated) = combat::resolve_player_attack(state) {
                log::trace!("enemy {defeated} defeated on turn {}", state.turn + 1);
            }
        }
        ActionKind::Pickup => {
            if let Some(item) = stage.uncollected_item_at(state, state.player.pos) {
                state.collected.insert(item);
            }
        }
        ActionKind::Wait | ActionKind::See => {}
    }
}

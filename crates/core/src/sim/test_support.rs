//! Shared test fixtures for the simulation, search and strategy test suites.
//! This module exists to avoid repeating stage setup across many tests.
//! It does not own production simulation logic.

use super::*;
use crate::config::{BoardConfig, EnemyConfig, GoalConfig, PlayerConfig};
use crate::types::Facing;

pub(crate) const MOVE_AND_TURNS: &[ActionKind] =
    &[ActionKind::Move, ActionKind::TurnLeft, ActionKind::TurnRight];

pub(crate) const ALL_ACTIONS: &[ActionKind] = &ActionKind::ALL;

pub(crate) fn open_config(
    width: usize,
    height: usize,
    player: (i32, i32),
    facing: Facing,
    goal: (i32, i32),
    allowed: &[ActionKind],
) -> StageConfiguration {
    StageConfiguration {
        board: BoardConfig::open(width, height),
        player: PlayerConfig::at(player.0, player.1, facing),
        goal: GoalConfig::at(goal.0, goal.1),
        enemies: Vec::new(),
        items: Vec::new(),
        allowed_actions: allowed.to_vec(),
        max_turns: 100,
    }
}

pub(crate) fn compile(config: StageConfiguration) -> Stage {
    Stage::compile(&config).expect("fixture stage should be structurally valid")
}

/// Applies every action and returns the final state, panicking on any terminal transition.
pub(crate) fn run(stage: &Stage, actions: &[ActionKind]) -> CompositeState {
    let mut state = stage.initial_state();
    for action in actions {
        state = apply(stage, &state, *action).expect("fixture action should apply").state;
    }
    state
}

pub(crate) fn run_until_last(stage: &Stage, actions: &[ActionKind]) -> Transition {
    let mut state = stage.initial_state();
    let mut last = None;
    for action in actions {
        let step = apply(stage, &state, *action).expect("fixture action should apply");
        state = step.state.clone();
        last = Some(step);
    }
    last.expect("fixture needs at least one action")
}

/// 9x5 room with one short-sighted patrol walking a horizontal lane along row 1 and back.
/// The goal sits in the south-east corner; the player starts south-west facing east.
/// The cells just past either end of the lane are only ever seen from point-blank range.
pub(crate) fn patrol_lane_config() -> StageConfiguration {
    let mut config = open_config(9, 5, (0, 4), Facing::East, (8, 4), ALL_ACTIONS);
    let lane: Vec<Pos> =
        (2..=6).chain((3..=5).rev()).map(|x| Pos::new(x, 1)).collect();
    let mut patrol = EnemyConfig::patrol("sentry", &lane, Facing::East);
    patrol.hp = 60;
    patrol.attack = 5;
    patrol.vision_range = 1;
    config.enemies.push(patrol);
    config.max_turns = 120;
    config
}

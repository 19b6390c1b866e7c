//! Cheap structural gate run before any simulation or search.
//! This module exists to reject malformed stage configurations with every problem listed at once.
//! It does not own solvability; a structurally clean stage may still be unsolvable.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::board::Board;
use crate::config::{EMPTY_GLYPH, StageConfiguration, WALL_GLYPH};
use crate::types::{ActionKind, EnemyBehavior, EnemyId, ItemId, Pos};

pub const MIN_BOARD_DIMENSION: usize = 1;
pub const MAX_BOARD_DIMENSION: usize = 64;
/// Floor below which a turn budget cannot host even a trivial walk.
pub const MIN_TURN_BUDGET: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralIssue {
    #[error(
        "board is {width}x{height}; each side must be within {min}..={max}",
        min = MIN_BOARD_DIMENSION,
        max = MAX_BOARD_DIMENSION
    )]
    BoardSize { width: usize, height: usize },
    #[error("grid has {found} rows but the board declares height {expected}")]
    RowCount { expected: usize, found: usize },
    #[error("grid row {row} has {found} cells but the board declares width {expected}")]
    RowWidth { row: usize, expected: usize, found: usize },
    #[error("grid row {row} column {column} holds unknown glyph {glyph:?}")]
    UnknownGlyph { row: usize, column: usize, glyph: char },
    #[error("{entity} at {pos} is outside the board")]
    OutOfBounds { entity: String, pos: Pos },
    #[error("{entity} at {pos} sits on a wall")]
    OnWall { entity: String, pos: Pos },
    #[error("enemy `{0}` starts on the player's cell")]
    EnemyOnPlayer(EnemyId),
    #[error("enemies `{first}` and `{second}` start on the same cell {pos}")]
    EnemiesOverlap { first: EnemyId, second: EnemyId, pos: Pos },
    #[error("enemy id `{0}` is declared more than once")]
    DuplicateEnemy(EnemyId),
    #[error("item id `{0}` is declared more than once")]
    DuplicateItem(ItemId),
    #[error("patrol enemy `{0}` has an empty patrol path")]
    EmptyPatrolPath(EnemyId),
    #[error("guard enemy `{0}` declares a patrol path")]
    GuardWithPatrolPath(EnemyId),
    #[error("player hit points must be positive")]
    PlayerWithoutHitPoints,
    #[error("enemy `{0}` starts with zero hit points")]
    EnemyWithoutHitPoints(EnemyId),
    #[error("allowed action set is empty")]
    NoAllowedActions,
    #[error("allowed actions must include `{action}` ({reason})")]
    MissingAction { action: ActionKind, reason: &'static str },
    #[error("allowed actions must include at least one turn action")]
    NoTurnAction,
    #[error("max_turns {max_turns} is below the floor of {floor}", floor = MIN_TURN_BUDGET)]
    TurnBudgetTooLow { max_turns: u32 },
}

/// Every structural violation in `config`, in a stable order. Empty means the stage compiles.
pub fn check_structure(config: &StageConfiguration) -> Vec<StructuralIssue> {
    let mut issues = Vec::new();
    let sized = check_grid(config, &mut issues);

    // Placement needs a materialized board, which is only safe once the size is in range.
    if sized {
        let board = Board::from_config(&config.board);
        check_placement(&board, "player", config.player.pos(), &mut issues);
        check_placement(&board, "goal", config.goal.pos(), &mut issues);
        check_enemies(config, &board, &mut issues);
        check_items(config, &board, &mut issues);
    }
    if config.player.hp == 0 {
        issues.push(StructuralIssue::PlayerWithoutHitPoints);
    }
    check_actions(config, &mut issues);

    if config.max_turns < MIN_TURN_BUDGET {
        issues.push(StructuralIssue::TurnBudgetTooLow { max_turns: config.max_turns });
    }

    if !issues.is_empty() {
        log::debug!("structural pre-validation rejected stage with {} issue(s)", issues.len());
    }
    issues
}

/// Returns whether both dimensions are in range.
fn check_grid(config: &StageConfiguration, issues: &mut Vec<StructuralIssue>) -> bool {
    let board = &config.board;
    let dimensions = MIN_BOARD_DIMENSION..=MAX_BOARD_DIMENSION;
    let sized = dimensions.contains(&board.width) && dimensions.contains(&board.height);
    if !sized {
        issues.push(StructuralIssue::BoardSize { width: board.width, height: board.height });
    }
    if board.grid.len() != board.height {
        issues.push(StructuralIssue::RowCount {
            expected: board.height,
            found: board.grid.len(),
        });
    }
    for (row, line) in board.grid.iter().enumerate() {
        let found = line.chars().count();
        if found != board.width {
            issues.push(StructuralIssue::RowWidth { row, expected: board.width, found });
        }
        for (column, glyph) in line.chars().enumerate() {
            if glyph != WALL_GLYPH && glyph != EMPTY_GLYPH {
                issues.push(StructuralIssue::UnknownGlyph { row, column, glyph });
            }
        }
    }
    sized
}

fn check_placement(board: &Board, entity: &str, pos: Pos, issues: &mut Vec<StructuralIssue>) {
    if !board.in_bounds(pos) {
        issues.push(StructuralIssue::OutOfBounds { entity: entity.to_string(), pos });
    } else if board.is_wall(pos) {
        issues.push(StructuralIssue::OnWall { entity: entity.to_string(), pos });
    }
}

fn check_enemies(config: &StageConfiguration, board: &Board, issues: &mut Vec<StructuralIssue>) {
    let mut ids = BTreeSet::new();
    let mut occupied: Vec<(Pos, &EnemyId)> = Vec::new();

    for enemy in &config.enemies {
        if !ids.insert(&enemy.id) {
            issues.push(StructuralIssue::DuplicateEnemy(enemy.id.clone()));
        }
        let pos = enemy.pos();
        check_placement(board, &format!("enemy `{}`", enemy.id), pos, issues);
        if pos == config.player.pos() {
            issues.push(StructuralIssue::EnemyOnPlayer(enemy.id.clone()));
        }
        if let Some((_, first)) = occupied.iter().find(|(at, _)| *at == pos) {
            issues.push(StructuralIssue::EnemiesOverlap {
                first: (*first).clone(),
                second: enemy.id.clone(),
                pos,
            });
        }
        occupied.push((pos, &enemy.id));

        if enemy.hp == 0 {
            issues.push(StructuralIssue::EnemyWithoutHitPoints(enemy.id.clone()));
        }

        match enemy.behavior {
            EnemyBehavior::Guard if !enemy.patrol_path.is_empty() => {
                issues.push(StructuralIssue::GuardWithPatrolPath(enemy.id.clone()));
            }
            EnemyBehavior::Guard => {}
            EnemyBehavior::Patrol if enemy.patrol_path.is_empty() => {
                issues.push(StructuralIssue::EmptyPatrolPath(enemy.id.clone()));
            }
            EnemyBehavior::Patrol => {
                for (index, waypoint) in enemy.patrol_cells().into_iter().enumerate() {
                    let entity = format!("waypoint {index} of enemy `{}`", enemy.id);
                    check_placement(board, &entity, waypoint, issues);
                }
            }
        }
    }
}

fn check_items(config: &StageConfiguration, board: &Board, issues: &mut Vec<StructuralIssue>) {
    let mut ids = BTreeSet::new();
    for item in &config.items {
        if !ids.insert(&item.id) {
            issues.push(StructuralIssue::DuplicateItem(item.id.clone()));
        }
        check_placement(board, &format!("item `{}`", item.id), item.pos(), issues);
    }
}

fn check_actions(config: &StageConfiguration, issues: &mut Vec<StructuralIssue>) {
    let allowed: BTreeSet<ActionKind> = config.allowed_actions.iter().copied().collect();
    if allowed.is_empty() {
        issues.push(StructuralIssue::NoAllowedActions);
        return;
    }
    if !allowed.contains(&ActionKind::Move) {
        issues.push(StructuralIssue::MissingAction {
            action: ActionKind::Move,
            reason: "every stage is navigated by moving",
        });
    }
    if !allowed.contains(&ActionKind::TurnLeft) && !allowed.contains(&ActionKind::TurnRight) {
        issues.push(StructuralIssue::NoTurnAction);
    }
    if config.goal.require_all_enemies_defeated
        && !config.enemies.is_empty()
        && !allowed.contains(&ActionKind::Attack)
    {
        issues.push(StructuralIssue::MissingAction {
            action: ActionKind::Attack,
            reason: "the goal requires defeating every enemy",
        });
    }
    if config.items.iter().any(|item| item.required) && !allowed.contains(&ActionKind::Pickup) {
        issues.push(StructuralIssue::MissingAction {
            action: ActionKind::Pickup,
            reason: "the goal requires collecting items",
        });
    }
}

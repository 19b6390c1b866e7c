//! Directional enemy vision and alert refresh.
//! This module exists to keep the detection geometry in one place, matching the live engine's
//! distance/offset enumeration exactly. It does not own movement or combat.
//!
//! For every `distance` in `1..=range` and every `offset` in `-distance..=distance` the cell
//! `distance` steps ahead and `offset` steps sideways is examined. Walls never occlude; only the
//! examined cell itself has to be in bounds and open.

use super::Stage;
use crate::board::Board;
use crate::state::CompositeState;
use crate::types::{Facing, Pos};

fn cone_cell(origin: Pos, facing: Facing, distance: i32, offset: i32) -> Pos {
    match facing {
        Facing::North => origin.offset(offset, -distance),
        Facing::South => origin.offset(offset, distance),
        Facing::East => origin.offset(distance, offset),
        Facing::West => origin.offset(-distance, offset),
    }
}

/// Farthest distance worth enumerating: from an on-board origin, nothing beyond
/// `width + height` steps is on the board.
fn effective_range(board: &Board, range: u32) -> i32 {
    let reach = i32::try_from(board.width + board.height).unwrap_or(i32::MAX);
    i32::try_from(range).unwrap_or(i32::MAX).min(reach)
}

pub fn can_see(board: &Board, origin: Pos, facing: Facing, range: u32, target: Pos) -> bool {
    if !board.is_walkable(target) {
        return false;
    }
    for distance in 1..=effective_range(board, range) {
        for offset in -distance..=distance {
            let candidate = cone_cell(origin, facing, distance, offset);
            if candidate == target && offset.abs() <= distance {
                return true;
            }
        }
    }
    false
}

/// Alert is exactly "the player is inside the cone this tick"; the last sighting is kept.
pub(super) fn refresh_alerts(stage: &Stage, state: &mut CompositeState) {
    let player = state.player.pos;
    for id in stage.enemy_order() {
        let Some(enemy) = state.enemies.get_mut(id) else {
            continue;
        };
        if enemy.is_defeated() {
            enemy.alert = false;
            continue;
        }
        let seen = can_see(stage.board(), enemy.pos, enemy.facing, enemy.vision_range, player);
        enemy.alert = seen;
        if seen {
            enemy.last_seen_player = Some(player);
        }
    }
}

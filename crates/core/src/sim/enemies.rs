//! Per-tick enemy movement: guards hold, patrols step along their cyclic waypoint list.

use super::Stage;
use super::movement::manhattan;
use crate::board::Board;
use crate::state::{CompositeState, EnemyState, PatrolRoute};
use crate::types::{Facing, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PatrolStep {
    facing: Option<Facing>,
    to: Option<Pos>,
    reached_waypoint: bool,
}

pub(super) fn advance_enemies(stage: &Stage, state: &mut CompositeState) {
    for id in stage.enemy_order() {
        let Some(enemy) = state.enemies.get(id) else {
            continue;
        };
        // Alert patrols hold position; the vision pass decides whether they stay alert.
        if enemy.is_defeated() || enemy.alert {
            continue;
        }
        let Some(route) = enemy.patrol.as_ref() else {
            continue;
        };
        let step = plan_patrol_step(enemy.pos, route, |next| {
            !stage.board().is_walkable(next)
                || state.player.pos == next
                || state.living_enemies().any(|other| other.id != enemy.id && other.pos == next)
        });

        let Some(enemy) = state.enemies.get_mut(id) else {
            continue;
        };
        if let Some(facing) = step.facing {
            enemy.facing = facing;
        }
        if let Some(to) = step.to {
            enemy.pos = to;
        }
        if step.reached_waypoint
            && let Some(route) = enemy.patrol.as_mut()
        {
            route.index = route.next_index();
        }
    }
}

/// Poses an enemy passes through over one unobstructed patrol lap, starting with its current
/// pose. Guards and single-waypoint patrols yield a single pose.
pub fn cycle_poses(board: &Board, enemy: &EnemyState) -> Vec<(Pos, Facing)> {
    let mut poses = vec![(enemy.pos, enemy.facing)];
    let Some(route) = enemy.patrol.as_ref() else {
        return poses;
    };
    let mut route = route.clone();
    let (mut pos, mut facing) = (enemy.pos, enemy.facing);
    // An enemy spawned off its path needs a lead-in before the lap starts repeating.
    let lead_in =
        if route.path.contains(&pos) { 0 } else { manhattan(pos, route.next_waypoint()) as usize };
    for _ in 0..route.period() + lead_in {
        let step = plan_patrol_step(pos, &route, |next| !board.is_walkable(next));
        if let Some(next_facing) = step.facing {
            facing = next_facing;
        }
        if let Some(to) = step.to {
            pos = to;
        }
        if step.reached_waypoint {
            route.index = route.next_index();
        }
        poses.push((pos, facing));
    }
    poses.dedup();
    poses
}

/// One cell toward the next waypoint, x axis first. Blocked steps turn the enemy but keep
/// both its position and its patrol index.
fn plan_patrol_step(
    pos: Pos,
    route: &PatrolRoute,
    is_blocked: impl Fn(Pos) -> bool,
) -> PatrolStep {
    let target = route.next_waypoint();
    if target == pos {
        return PatrolStep { facing: None, to: None, reached_waypoint: true };
    }

    let dx = (target.x - pos.x).signum();
    let dy = (target.y - pos.y).signum();
    let next = if dx != 0 { pos.offset(dx, 0) } else { pos.offset(0, dy) };
    let facing = Facing::toward(pos, next);

    if is_blocked(next) {
        return PatrolStep { facing, to: None, reached_waypoint: false };
    }
    PatrolStep { facing, to: Some(next), reached_waypoint: next == target }
}

//! Deterministic movement primitives and static shortest-path helpers.
//! This module exists so grid navigation rules are reusable across simulation and strategies.
//! It does not own enemy behavior or player decision flow.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::board::Board;
use crate::state::CompositeState;
use crate::types::{ActionKind, Facing, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

/// A player may enter a cell that is walkable and not held by a living enemy.
pub(crate) fn is_open_for_player(board: &Board, state: &CompositeState, pos: Pos) -> bool {
    board.is_walkable(pos) && state.living_enemy_at(pos).is_none()
}

/// Breadth-first step counts from `start` to every cell reachable around `blocked`.
pub fn distances_from(board: &Board, start: Pos, blocked: &BTreeSet<Pos>) -> BTreeMap<Pos, u32> {
    let mut distances = BTreeMap::new();
    if !board.is_walkable(start) {
        return distances;
    }

    let mut queue = VecDeque::new();
    distances.insert(start, 0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let next_distance = distances.get(&current).copied().unwrap_or_default() + 1;
        for neighbor in neighbors(current) {
            if board.is_walkable(neighbor)
                && !blocked.contains(&neighbor)
                && !distances.contains_key(&neighbor)
            {
                distances.insert(neighbor, next_distance);
                queue.push_back(neighbor);
            }
        }
    }

    distances
}

/// Shortest 4-neighbour path over the static board, excluding `start`. Ties resolve by the
/// `(f, h, y, x)` ordering so the same inputs always yield the same path.
pub fn astar_path(board: &Board, start: Pos, goal: Pos, blocked: &BTreeSet<Pos>) -> Option<Vec<Pos>> {
    if !board.is_walkable(start) || !board.is_walkable(goal) || blocked.contains(&goal) {
        return None;
    }
    if start == goal {
        return Some(vec![]);
    }
    let mut open_set = BTreeSet::new();
    let mut g_score = BTreeMap::new();
    let mut came_from = BTreeMap::new();
    let h = manhattan(start, goal);
    open_set.insert(OpenNode { f: h, h, y: start.y, x: start.x });
    g_score.insert(start, 0u32);
    while let Some(curr) = open_set.pop_first() {
        let p = Pos { y: curr.y, x: curr.x };
        if p == goal {
            return reconstruct_path(&came_from, start, goal);
        }
        let Some(cur_g) = g_score.get(&p).copied() else {
            continue;
        };
        for n in neighbors(p) {
            if !board.is_walkable(n) || blocked.contains(&n) {
                continue;
            }
            let tg = cur_g + 1;
            if tg < *g_score.get(&n).unwrap_or(&u32::MAX) {
                came_from.insert(n, p);
                g_score.insert(n, tg);
                let h = manhattan(n, goal);
                open_set.insert(OpenNode { f: tg + h, h, y: n.y, x: n.x });
            }
        }
    }
    None
}

fn reconstruct_path(came: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Option<Vec<Pos>> {
    let mut p = goal;
    let mut result = vec![p];
    while p != start {
        p = *came.get(&p)?;
        result.push(p);
    }
    result.reverse();
    result.remove(0);
    Some(result)
}

/// Turn actions that rotate `from` into `to`, using whichever allowed direction is shorter.
/// Returns `None` when no allowed turn action can reach the target facing.
pub fn rotation(from: Facing, to: Facing, can_left: bool, can_right: bool) -> Option<Vec<ActionKind>> {
    let rights = (0..4).scan(from, |facing, _| {
        let current = *facing;
        *facing = facing.turn_right();
        Some(current)
    });
    let right_steps = rights.take_while(|facing| *facing != to).count();
    if right_steps == 0 {
        return Some(Vec::new());
    }
    let left_steps = 4 - right_steps;
    match (can_left, can_right) {
        (true, true) if left_steps < right_steps => Some(vec![ActionKind::TurnLeft; left_steps]),
        (_, true) => Some(vec![ActionKind::TurnRight; right_steps]),
        (true, false) => Some(vec![ActionKind::TurnLeft; left_steps]),
        (false, false) => None,
    }
}

/// Converts a cell path (excluding the start cell) into turn/move actions.
/// Returns the actions and the facing after the last move.
pub fn path_to_actions(
    start: Pos,
    facing: Facing,
    path: &[Pos],
    can_left: bool,
    can_right: bool,
) -> Option<(Vec<ActionKind>, Facing)> {
    let mut actions = Vec::new();
    let mut current = start;
    let mut facing = facing;
    for next in path {
        let wanted = Facing::toward(current, *next)?;
        actions.extend(rotation(facing, wanted, can_left, can_right)?);
        actions.push(ActionKind::Move);
        facing = wanted;
        current = *next;
    }
    Some((actions, facing))
}

pub fn neighbors(p: Pos) -> [Pos; 4] {
    [
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y, x: p.x - 1 },
    ]
}

pub fn manhattan(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TileKind;

    #[test]
    fn astar_straight_line_path_has_expected_length() {
        let board = Board::new(7, 7);
        let path = astar_path(&board, Pos::new(2, 3), Pos::new(5, 3), &BTreeSet::new())
            .expect("path");
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Pos::new(3, 3));
        assert_eq!(path[2], Pos::new(5, 3));
    }

    #[test]
    fn astar_tie_break_uses_deterministic_order() {
        let mut board = Board::new(7, 7);
        board.set_tile(Pos::new(3, 3), TileKind::Wall);
        let path = astar_path(&board, Pos::new(2, 3), Pos::new(4, 3), &BTreeSet::new())
            .expect("path");
        assert_eq!(path[0], Pos::new(2, 2));
    }

    #[test]
    fn astar_respects_blocked_cells_and_unreachable_goals() {
        let board = Board::new(3, 1);
        let blocked = BTreeSet::from([Pos::new(1, 0)]);
        assert!(astar_path(&board, Pos::new(0, 0), Pos::new(2, 0), &blocked).is_none());
        assert_eq!(distances_from(&board, Pos::new(0, 0), &blocked).len(), 1);
    }

    #[test]
    fn distances_walk_around_walls() {
        let mut board = Board::new(3, 3);
        board.set_tile(Pos::new(1, 1), TileKind::Wall);
        let distances = distances_from(&board, Pos::new(0, 1), &BTreeSet::new());
        assert_eq!(distances.get(&Pos::new(2, 1)), Some(&4));
        assert_eq!(distances.get(&Pos::new(1, 1)), None);
        assert_eq!(distances.len(), 8);
    }

    #[test]
    fn rotation_prefers_shorter_allowed_direction() {
        assert_eq!(rotation(Facing::East, Facing::East, true, true), Some(vec![]));
        assert_eq!(
            rotation(Facing::East, Facing::North, true, true),
            Some(vec![ActionKind::TurnLeft])
        );
        assert_eq!(
            rotation(Facing::East, Facing::North, false, true),
            Some(vec![ActionKind::TurnRight; 3])
        );
        assert_eq!(
            rotation(Facing::East, Facing::West, true, true),
            Some(vec![ActionKind::TurnRight; 2])
        );
        assert_eq!(rotation(Facing::East, Facing::South, false, false), None);
    }

    #[test]
    fn path_to_actions_turns_before_moving() {
        let path = [Pos::new(1, 0), Pos::new(1, 1)];
        let (actions, facing) =
            path_to_actions(Pos::new(0, 0), Facing::East, &path, true, true).expect("actions");
        assert_eq!(actions, vec![ActionKind::Move, ActionKind::TurnRight, ActionKind::Move]);
        assert_eq!(facing, Facing::South);
    }
}

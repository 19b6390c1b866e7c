//! Shared vocabulary types: positions, facings, actions and entity ids.
//! This module exists so every other module names the same things the same way.
//! It does not own any game rules.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }

    pub fn step(self, facing: Facing) -> Self {
        let (dx, dy) = facing.delta();
        self.offset(dx, dy)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal facing. `y` grows southward, so north is `(0, -1)`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    #[serde(alias = "N", alias = "up")]
    North,
    #[default]
    #[serde(alias = "E", alias = "right")]
    East,
    #[serde(alias = "S", alias = "down")]
    South,
    #[serde(alias = "W", alias = "left")]
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    pub fn turn_right(self) -> Self {
        match self {
            Facing::North => Facing::East,
            Facing::East => Facing::South,
            Facing::South => Facing::West,
            Facing::West => Facing::North,
        }
    }

    pub fn turn_left(self) -> Self {
        match self {
            Facing::North => Facing::West,
            Facing::West => Facing::South,
            Facing::South => Facing::East,
            Facing::East => Facing::North,
        }
    }

    /// Facing for a single orthogonal step from `from` to `to`, if they are adjacent.
    pub fn toward(from: Pos, to: Pos) -> Option<Self> {
        Facing::ALL.into_iter().find(|facing| from.step(*facing) == to)
    }
}

/// Player-facing action vocabulary. Wire names double as the API names in synthesized code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    TurnLeft,
    TurnRight,
    Move,
    Attack,
    Wait,
    #[serde(alias = "pick_up")]
    Pickup,
    See,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::TurnLeft,
        ActionKind::TurnRight,
        ActionKind::Move,
        ActionKind::Attack,
        ActionKind::Wait,
        ActionKind::Pickup,
        ActionKind::See,
    ];

    pub fn api_name(self) -> &'static str {
        match self {
            ActionKind::TurnLeft => "turn_left",
            ActionKind::TurnRight => "turn_right",
            ActionKind::Move => "move",
            ActionKind::Attack => "attack",
            ActionKind::Wait => "wait",
            ActionKind::Pickup => "pickup",
            ActionKind::See => "see",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

pub type ActionSequence = Vec<ActionKind>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyBehavior {
    #[serde(alias = "static")]
    Guard,
    Patrol,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyId(pub String);

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

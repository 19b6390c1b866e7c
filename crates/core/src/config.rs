//! Immutable stage description handed over by the stage loading layer, plus validation options.
//! This module exists to keep the wire-shaped input separate from the compiled simulation stage.
//! It does not own structural checks or any simulation rules.

use serde::{Deserialize, Serialize};

use crate::types::{ActionKind, EnemyBehavior, EnemyId, Facing, ItemId, Pos};

pub const WALL_GLYPH: char = '#';
pub const EMPTY_GLYPH: char = '.';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfiguration {
    pub board: BoardConfig,
    pub player: PlayerConfig,
    pub goal: GoalConfig,
    #[serde(default)]
    pub enemies: Vec<EnemyConfig>,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
    pub allowed_actions: Vec<ActionKind>,
    pub max_turns: u32,
}

/// Row-major grid, one string per row: `'#'` is a wall, `'.'` is empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub grid: Vec<String>,
}

impl BoardConfig {
    pub fn open(width: usize, height: usize) -> Self {
        let row = EMPTY_GLYPH.to_string().repeat(width);
        Self { width, height, grid: vec![row; height] }
    }

    pub fn with_walls(mut self, walls: &[Pos]) -> Self {
        for wall in walls {
            let (Ok(x), Ok(y)) = (usize::try_from(wall.x), usize::try_from(wall.y)) else {
                continue;
            };
            let Some(row) = self.grid.get_mut(y) else {
                continue;
            };
            if x < row.chars().count() {
                *row = row
                    .chars()
                    .enumerate()
                    .map(|(i, c)| if i == x { WALL_GLYPH } else { c })
                    .collect();
            }
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default = "default_player_hp")]
    pub hp: u32,
    #[serde(default = "default_player_hp")]
    pub max_hp: u32,
    #[serde(default = "default_player_attack")]
    pub attack: u32,
}

impl PlayerConfig {
    pub fn at(x: i32, y: i32, facing: Facing) -> Self {
        Self {
            x,
            y,
            facing,
            hp: default_player_hp(),
            max_hp: default_player_hp(),
            attack: default_player_attack(),
        }
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalConfig {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub require_all_enemies_defeated: bool,
}

impl GoalConfig {
    pub fn at(x: i32, y: i32) -> Self {
        Self { x, y, require_all_enemies_defeated: false }
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyConfig {
    pub id: EnemyId,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub facing: Facing,
    pub hp: u32,
    #[serde(default)]
    pub max_hp: Option<u32>,
    #[serde(default)]
    pub attack: u32,
    pub behavior: EnemyBehavior,
    #[serde(default = "default_vision_range")]
    pub vision_range: u32,
    /// Cyclic waypoints as `[x, y]` pairs. Required for patrol enemies, absent for guards.
    #[serde(default)]
    pub patrol_path: Vec<[i32; 2]>,
}

impl EnemyConfig {
    pub fn guard(id: &str, x: i32, y: i32, facing: Facing) -> Self {
        Self {
            id: EnemyId(id.to_string()),
            x,
            y,
            facing,
            hp: 50,
            max_hp: None,
            attack: 10,
            behavior: EnemyBehavior::Guard,
            vision_range: default_vision_range(),
            patrol_path: Vec::new(),
        }
    }

    pub fn patrol(id: &str, path: &[Pos], facing: Facing) -> Self {
        let start = path.first().copied().unwrap_or(Pos::new(0, 0));
        Self {
            id: EnemyId(id.to_string()),
            x: start.x,
            y: start.y,
            facing,
            hp: 50,
            max_hp: None,
            attack: 10,
            behavior: EnemyBehavior::Patrol,
            vision_range: default_vision_range(),
            patrol_path: path.iter().map(|p| [p.x, p.y]).collect(),
        }
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.x, self.y)
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp.unwrap_or(self.hp)
    }

    pub fn patrol_cells(&self) -> Vec<Pos> {
        self.patrol_path.iter().map(|[x, y]| Pos::new(*x, *y)).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemConfig {
    pub id: ItemId,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_required")]
    pub required: bool,
}

impl ItemConfig {
    pub fn pos(&self) -> Pos {
        Pos::new(self.x, self.y)
    }
}

/// Knobs for a single `validate` call. Every field has a default, so partial TOML/JSON works.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Hard cap on expanded search nodes; `None` scales with stage complexity.
    pub node_budget: Option<u64>,
    /// Wall-clock cap in milliseconds; `None` keeps results bit-for-bit reproducible.
    pub time_budget_ms: Option<u64>,
    pub use_patrol_validator: bool,
    pub include_analysis: bool,
    pub include_code: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            node_budget: None,
            time_budget_ms: None,
            use_patrol_validator: true,
            include_analysis: true,
            include_code: true,
        }
    }
}

fn default_player_hp() -> u32 {
    100
}

fn default_player_attack() -> u32 {
    30
}

fn default_vision_range() -> u32 {
    3
}

fn default_required() -> bool {
    true
}

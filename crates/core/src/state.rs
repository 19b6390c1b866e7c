//! Composite search state: player, every enemy keyed by id, collected items and the turn counter.
//! This module exists so search deduplication has one field-by-field equality to rely on.
//! It does not own transition rules; states are only ever replaced, never edited in place.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hasher;
use std::sync::Arc;

use xxhash_rust::xxh3::Xxh3;

use crate::config::{EnemyConfig, StageConfiguration};
use crate::types::{EnemyBehavior, EnemyId, Facing, ItemId, Pos};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerState {
    pub pos: Pos,
    pub facing: Facing,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
}

/// Cyclic waypoint list shared by every state derived from the same stage.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatrolRoute {
    pub path: Arc<[Pos]>,
    /// Waypoint most recently reached. Always `< path.len()`.
    pub index: usize,
}

impl PatrolRoute {
    /// Starts at the waypoint the enemy stands on, or just before the first waypoint when the
    /// spawn is off the path so the first target is `path[0]`.
    pub fn new(path: Vec<Pos>, spawn: Pos) -> Self {
        let len = path.len().max(1);
        let index = path.iter().position(|p| *p == spawn).unwrap_or(len - 1);
        Self { path: path.into(), index }
    }

    pub fn next_index(&self) -> usize {
        (self.index + 1) % self.path.len()
    }

    pub fn next_waypoint(&self) -> Pos {
        self.path[self.next_index()]
    }

    /// Ticks one unobstructed lap takes: one per cell walked, and one for a waypoint that
    /// repeats its predecessor.
    pub fn period(&self) -> usize {
        let len = self.path.len();
        (0..len)
            .map(|i| {
                let (a, b) = (self.path[i], self.path[(i + 1) % len]);
                (a.x.abs_diff(b.x) + a.y.abs_diff(b.y)).max(1) as usize
            })
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnemyState {
    pub id: EnemyId,
    pub pos: Pos,
    pub facing: Facing,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub behavior: EnemyBehavior,
    pub vision_range: u32,
    pub alert: bool,
    pub last_seen_player: Option<Pos>,
    pub patrol: Option<PatrolRoute>,
}

impl EnemyState {
    pub fn from_config(config: &EnemyConfig) -> Self {
        let patrol = match config.behavior {
            EnemyBehavior::Patrol if !config.patrol_path.is_empty() => {
                Some(PatrolRoute::new(config.patrol_cells(), config.pos()))
            }
            _ => None,
        };
        Self {
            id: config.id.clone(),
            pos: config.pos(),
            facing: config.facing,
            hp: config.hp,
            max_hp: config.max_hp(),
            attack: config.attack,
            behavior: config.behavior,
            vision_range: config.vision_range,
            alert: false,
            last_seen_player: None,
            patrol,
        }
    }

    /// Defeated enemies stay in the map but are ignored by every occupancy, danger and goal check.
    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeState {
    pub player: PlayerState,
    pub enemies: BTreeMap<EnemyId, EnemyState>,
    pub collected: BTreeSet<ItemId>,
    pub turn: u32,
}

impl CompositeState {
    /// Turn-0 state straight from the stage configuration.
    pub fn initial(config: &StageConfiguration) -> Self {
        let player = PlayerState {
            pos: config.player.pos(),
            facing: config.player.facing,
            hp: config.player.hp,
            max_hp: config.player.max_hp,
            attack: config.player.attack,
        };
        let enemies = config
            .enemies
            .iter()
            .map(|enemy| (enemy.id.clone(), EnemyState::from_config(enemy)))
            .collect();
        Self { player, enemies, collected: BTreeSet::new(), turn: 0 }
    }

    pub fn enemy(&self, id: &EnemyId) -> Option<&EnemyState> {
        self.enemies.get(id)
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &EnemyState> {
        self.enemies.values().filter(|enemy| !enemy.is_defeated())
    }

    pub fn living_enemy_at(&self, pos: Pos) -> Option<&EnemyState> {
        self.living_enemies().find(|enemy| enemy.pos == pos)
    }

    pub fn all_enemies_defeated(&self) -> bool {
        self.enemies.values().all(EnemyState::is_defeated)
    }

    pub fn any_alert(&self) -> bool {
        self.living_enemies().any(|enemy| enemy.alert)
    }

    /// Stable 64-bit digest for cheap cross-run comparison. Equality remains the dedup key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u32(self.turn);
        hasher.write_i32(self.player.pos.x);
        hasher.write_i32(self.player.pos.y);
        hasher.write_u8(self.player.facing as u8);
        hasher.write_u32(self.player.hp);
        for (id, enemy) in &self.enemies {
            hasher.write(id.0.as_bytes());
            hasher.write_u8(0xff);
            hasher.write_i32(enemy.pos.x);
            hasher.write_i32(enemy.pos.y);
            hasher.write_u8(enemy.facing as u8);
            hasher.write_u32(enemy.hp);
            hasher.write_u8(u8::from(enemy.alert));
            match enemy.last_seen_player {
                Some(seen) => {
                    hasher.write_u8(1);
                    hasher.write_i32(seen.x);
                    hasher.write_i32(seen.y);
                }
                None => hasher.write_u8(0),
            }
            if let Some(route) = &enemy.patrol {
                hasher.write_usize(route.index);
            }
        }
        for item in &self.collected {
            hasher.write(item.0.as_bytes());
            hasher.write_u8(0xfe);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoardConfig, EnemyConfig, GoalConfig, PlayerConfig};
    use crate::types::ActionKind;

    fn config_with(enemies: Vec<EnemyConfig>) -> StageConfiguration {
        StageConfiguration {
            board: BoardConfig::open(6, 6),
            player: PlayerConfig::at(0, 0, Facing::East),
            goal: GoalConfig::at(5, 5),
            enemies,
            items: Vec::new(),
            allowed_actions: vec![ActionKind::Move, ActionKind::TurnRight],
            max_turns: 30,
        }
    }

    #[test]
    fn patrol_route_starts_at_spawn_waypoint() {
        let path = vec![Pos::new(1, 1), Pos::new(2, 1), Pos::new(3, 1)];
        let route = PatrolRoute::new(path.clone(), Pos::new(2, 1));
        assert_eq!(route.index, 1);
        assert_eq!(route.next_waypoint(), Pos::new(3, 1));

        let off_path = PatrolRoute::new(path, Pos::new(4, 4));
        assert_eq!(off_path.index, 2);
        assert_eq!(off_path.next_waypoint(), Pos::new(1, 1));
    }

    #[test]
    fn initial_state_has_every_enemy_and_turn_zero() {
        let config = config_with(vec![
            EnemyConfig::guard("g", 3, 3, Facing::West),
            EnemyConfig::patrol("p", &[Pos::new(1, 4), Pos::new(2, 4)], Facing::East),
        ]);
        let state = CompositeState::initial(&config);
        assert_eq!(state.turn, 0);
        assert_eq!(state.enemies.len(), 2);
        assert!(state.enemy(&EnemyId("g".into())).expect("guard").patrol.is_none());
        let patrol = state.enemy(&EnemyId("p".into())).expect("patrol");
        assert_eq!(patrol.patrol.as_ref().map(|route| route.index), Some(0));
        assert!(!state.all_enemies_defeated());
    }

    #[test]
    fn equality_and_fingerprint_track_enemy_state() {
        let config = config_with(vec![EnemyConfig::guard("g", 3, 3, Facing::West)]);
        let base = CompositeState::initial(&config);
        let mut alerted = base.clone();
        alerted.enemies.values_mut().for_each(|enemy| enemy.alert = true);

        assert_ne!(base, alerted);
        assert_ne!(base.fingerprint(), alerted.fingerprint());
        assert_eq!(base.fingerprint(), CompositeState::initial(&config).fingerprint());
    }

    #[test]
    fn defeated_enemy_is_not_living() {
        let config = config_with(vec![EnemyConfig::guard("g", 3, 3, Facing::West)]);
        let mut state = CompositeState::initial(&config);
        state.enemies.values_mut().for_each(|enemy| enemy.hp = 0);
        assert!(state.living_enemy_at(Pos::new(3, 3)).is_none());
        assert!(state.all_enemies_defeated());
    }
}

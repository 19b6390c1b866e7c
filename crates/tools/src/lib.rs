//! File loading and seeded stage generation shared by the `validate` and `fuzz` binaries.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use stage_core::config::{BoardConfig, EnemyConfig, GoalConfig, ItemConfig, PlayerConfig};
use stage_core::{ActionKind, Facing, ItemId, Pos, StageConfiguration, ValidationOptions};

pub fn load_stage(path: &Path) -> Result<StageConfiguration> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read stage file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse stage JSON: {}", path.display()))
}

/// Reads options from TOML. No path means all defaults.
pub fn load_options(path: Option<&Path>) -> Result<ValidationOptions> {
    let Some(path) = path else {
        return Ok(ValidationOptions::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse options TOML: {}", path.display()))
}

fn below(rng: &mut ChaCha8Rng, n: u64) -> u64 {
    rng.next_u64() % n.max(1)
}

fn choose<T: Copy>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    slice[below(rng, slice.len() as u64) as usize]
}

/// Pops a random cell so no two entities are placed on the same one.
fn take(rng: &mut ChaCha8Rng, cells: &mut Vec<Pos>) -> Option<Pos> {
    if cells.is_empty() {
        return None;
    }
    let index = below(rng, cells.len() as u64) as usize;
    Some(cells.swap_remove(index))
}

/// Structurally valid stage built from `seed`: scattered walls, a player, a goal and at most one
/// item, guard and two-waypoint patrol each.
pub fn random_stage(seed: u64) -> StageConfiguration {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let width = 4 + below(&mut rng, 5) as usize;
    let height = 3 + below(&mut rng, 4) as usize;

    let mut open = Vec::new();
    let mut walls = Vec::new();
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            if below(&mut rng, 100) < 15 {
                walls.push(Pos::new(x, y));
            } else {
                open.push(Pos::new(x, y));
            }
        }
    }
    // Keep at least the corners open so placement never runs dry.
    for corner in [Pos::new(0, 0), Pos::new(width as i32 - 1, height as i32 - 1)] {
        if let Some(index) = walls.iter().position(|wall| *wall == corner) {
            open.push(walls.swap_remove(index));
        }
    }

    let facings = [Facing::North, Facing::East, Facing::South, Facing::West];
    let player = take(&mut rng, &mut open).unwrap_or(Pos::new(0, 0));
    let goal = take(&mut rng, &mut open).unwrap_or(player);

    let mut enemies = Vec::new();
    if below(&mut rng, 2) == 0
        && let Some(pos) = take(&mut rng, &mut open)
    {
        let mut guard = EnemyConfig::guard("guard", pos.x, pos.y, choose(&mut rng, &facings));
        guard.hp = 10 + 10 * below(&mut rng, 8) as u32;
        guard.vision_range = 1 + below(&mut rng, 3) as u32;
        enemies.push(guard);
    }
    if below(&mut rng, 2) == 0
        && let (Some(start), Some(end)) = (take(&mut rng, &mut open), take(&mut rng, &mut open))
    {
        let mut patrol = EnemyConfig::patrol("patrol", &[start, end], choose(&mut rng, &facings));
        patrol.vision_range = 1 + below(&mut rng, 2) as u32;
        enemies.push(patrol);
    }

    let mut items = Vec::new();
    if below(&mut rng, 3) == 0
        && let Some(pos) = take(&mut rng, &mut open)
    {
        items.push(ItemConfig { id: ItemId("gem".into()), x: pos.x, y: pos.y, required: true });
    }

    StageConfiguration {
        board: BoardConfig::open(width, height).with_walls(&walls),
        player: PlayerConfig::at(player.x, player.y, choose(&mut rng, &facings)),
        goal: GoalConfig::at(goal.x, goal.y),
        enemies,
        items,
        allowed_actions: ActionKind::ALL.to_vec(),
        max_turns: 3 * (width + height) as u32 + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::Stage;
    use tempfile::tempdir;

    const STAGE_JSON: &str = r#"{
        "board": { "width": 3, "height": 1, "grid": ["..."] },
        "player": { "x": 0, "y": 0, "facing": "E" },
        "goal": { "x": 2, "y": 0 },
        "allowed_actions": ["move", "turn_left"],
        "max_turns": 10
    }"#;

    #[test]
    fn stage_file_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stage.json");
        fs::write(&path, STAGE_JSON).unwrap();

        let config = load_stage(&path).unwrap();
        assert_eq!(config.board.width, 3);
        assert_eq!(config.goal.pos(), Pos::new(2, 0));
    }

    #[test]
    fn bad_stage_json_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_stage(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
        assert!(load_stage(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn options_toml_overrides_only_what_it_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.toml");
        fs::write(&path, "node_budget = 500\nuse_patrol_validator = false\n").unwrap();

        let options = load_options(Some(&path)).unwrap();
        assert_eq!(options.node_budget, Some(500));
        assert!(!options.use_patrol_validator);
        assert!(options.include_code);
        assert_eq!(load_options(None).unwrap(), ValidationOptions::default());
    }

    #[test]
    fn generated_stages_are_reproducible_and_valid() {
        for seed in 0..50 {
            let config = random_stage(seed);
            assert_eq!(config, random_stage(seed));
            if let Err(err) = Stage::compile(&config) {
                panic!("seed {seed} produced an invalid stage: {err}");
            }
        }
    }
}

use stage_core::config::{EnemyConfig, ItemConfig};
use stage_core::search::{SearchPolicy, search_with_policy};
use stage_core::{
    ActionKind, Facing, ItemId, Pos, SearchOutcome, Stage, StageConfiguration, ValidationOptions,
    replay_actions, validate,
};

fn busy_stage() -> StageConfiguration {
    let json = r#"{
        "board": { "width": 7, "height": 5, "grid": [
            ".......",
            ".##.#..",
            ".......",
            "..#.##.",
            "......."
        ] },
        "player": { "x": 0, "y": 0, "facing": "E" },
        "goal": { "x": 6, "y": 4 },
        "allowed_actions": ["turn_left", "turn_right", "move", "attack", "wait", "pickup"],
        "max_turns": 60
    }"#;
    let mut config: StageConfiguration = serde_json::from_str(json).expect("fixture parses");
    config.items.push(ItemConfig { id: ItemId("key".into()), x: 3, y: 2, required: true });
    let mut patrol =
        EnemyConfig::patrol("loop", &[Pos::new(6, 0), Pos::new(6, 2)], Facing::South);
    patrol.vision_range = 1;
    config.enemies.push(patrol);
    config
}

#[test]
fn repeated_validation_is_identical() {
    let config = busy_stage();
    let options = ValidationOptions::default();
    let first = validate(&config, &options);
    for _ in 0..3 {
        assert_eq!(validate(&config, &options), first);
    }
    assert!(first.success, "{}", first.summary());
}

#[test]
fn search_without_patrol_strategies_is_also_reproducible() {
    let options = ValidationOptions { use_patrol_validator: false, ..ValidationOptions::default() };
    let config = busy_stage();
    let first = validate(&config, &options);
    let second = validate(&config, &options);
    assert_eq!(first.solution, second.solution);
    assert_eq!(first.search, second.search);
    assert_eq!(first.final_fingerprint, second.final_fingerprint);
}

#[test]
fn replayed_solution_reaches_the_reported_fingerprint() {
    let config = busy_stage();
    let stage = Stage::compile(&config).expect("valid");
    let report = search_with_policy(
        &stage.initial_state(),
        &stage,
        &SearchPolicy::with_max_expansions(200_000),
    );
    let SearchOutcome::Found(actions) = report.outcome else {
        panic!("busy stage should be solvable");
    };
    assert!(actions.contains(&ActionKind::Pickup));

    let trace = replay_actions(&stage, &actions).expect("search output replays");
    let options = ValidationOptions { use_patrol_validator: false, ..ValidationOptions::default() };
    let result = validate(&config, &options);
    assert_eq!(result.final_fingerprint, Some(trace.final_fingerprint()));
}

#[test]
fn different_stages_get_different_digests() {
    let config = busy_stage();
    let mut other = config.clone();
    other.max_turns += 1;
    let options = ValidationOptions::default();
    assert_ne!(validate(&config, &options).stage_digest, validate(&other, &options).stage_digest);
}

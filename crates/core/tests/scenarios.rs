use stage_core::config::{BoardConfig, EnemyConfig, GoalConfig, PlayerConfig};
use stage_core::patrol::Strategy;
use stage_core::search::BudgetLimit;
use stage_core::{
    ActionKind, Facing, FailureKind, Pos, Solver, StageConfiguration, ValidationOptions, validate,
};

fn open_room(width: usize, height: usize, allowed: &[ActionKind]) -> StageConfiguration {
    StageConfiguration {
        board: BoardConfig::open(width, height),
        player: PlayerConfig::at(0, 0, Facing::East),
        goal: GoalConfig::at(width as i32 - 1, height as i32 - 1),
        enemies: Vec::new(),
        items: Vec::new(),
        allowed_actions: allowed.to_vec(),
        max_turns: 100,
    }
}

fn count(actions: &[ActionKind], kind: ActionKind) -> usize {
    actions.iter().filter(|a| **a == kind).count()
}

#[test]
fn empty_five_by_five_room_needs_eight_moves() {
    let allowed = [ActionKind::TurnLeft, ActionKind::TurnRight, ActionKind::Move, ActionKind::See];
    let result = validate(&open_room(5, 5, &allowed), &ValidationOptions::default());

    assert!(result.success, "{}", result.summary());
    assert_eq!(result.solution_length, 8);
    assert_eq!(result.action_count, 9);
    assert_eq!(count(&result.solution, ActionKind::Move), 8);
    assert!(!result.required_actions.contains(&ActionKind::See));
    let code = result.code.expect("code requested");
    assert!(code.compact.contains("for _ in range(4):"));
}

#[test]
fn blocking_guard_takes_ceil_hp_over_attack_strikes() {
    let mut config = open_room(5, 1, &ActionKind::ALL);
    let mut guard = EnemyConfig::guard("warden", 2, 0, Facing::North);
    guard.hp = 100;
    config.enemies.push(guard);
    assert_eq!(config.player.attack, 30);

    let result = validate(&config, &ValidationOptions::default());
    assert!(result.success, "{}", result.summary());
    assert_eq!(result.solver, Some(Solver::Search));
    assert_eq!(count(&result.solution, ActionKind::Attack), 4);
    assert_eq!(result.solution_length, 4);

    // The fourth attack is the one that clears the corridor.
    let last_attack = result.solution.iter().rposition(|a| *a == ActionKind::Attack);
    assert_eq!(last_attack, Some(4));
}

/// A lane patrol whose loop never sees the cell just past its west end, except from next door.
fn ambush_config() -> StageConfiguration {
    let mut config = open_room(9, 5, &ActionKind::ALL);
    config.player = PlayerConfig::at(0, 4, Facing::East);
    config.goal = GoalConfig::at(8, 4);
    let lane: Vec<Pos> = (2..=6).chain((3..=5).rev()).map(|x| Pos::new(x, 1)).collect();
    let mut patrol = EnemyConfig::patrol("sentry", &lane, Facing::East);
    patrol.hp = 60;
    patrol.attack = 5;
    patrol.vision_range = 1;
    config.enemies.push(patrol);
    config.max_turns = 120;
    config
}

#[test]
fn patrol_stage_is_solved_by_waiting_then_attacking() {
    let result = validate(&ambush_config(), &ValidationOptions::default());
    assert!(result.success, "{}", result.summary());
    assert_eq!(result.solver, Some(Solver::Patrol(Strategy::TacticalCombat)));

    let first_attack = result.solution.iter().position(|a| *a == ActionKind::Attack);
    let first_wait = result.solution.iter().position(|a| *a == ActionKind::Wait);
    assert!(first_wait < first_attack);
    assert_eq!(count(&result.solution, ActionKind::Attack), 2);
}

#[test]
fn same_patrol_stage_with_tiny_search_budget_is_exhausted_not_unsolvable() {
    let options = ValidationOptions {
        node_budget: Some(3),
        use_patrol_validator: false,
        ..ValidationOptions::default()
    };
    let result = validate(&ambush_config(), &options);
    assert!(!result.success);
    assert!(!result.path_found);
    assert_eq!(result.failure, Some(FailureKind::Exhausted { limit: BudgetLimit::Nodes }));
    assert_ne!(result.failure, Some(FailureKind::Unsolvable));
}

#[test]
fn stage_json_round_trips_into_the_same_verdict() {
    let config = ambush_config();
    let json = serde_json::to_string(&config).expect("serialize");
    let parsed: StageConfiguration = serde_json::from_str(&json).expect("parse");
    let options = ValidationOptions::default();
    assert_eq!(validate(&parsed, &options), validate(&config, &options));
}

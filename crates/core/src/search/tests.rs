use super::*;
use crate::config::{EnemyConfig, ItemConfig};
use crate::replay::replay_actions;
use crate::sim::test_support::*;
use crate::types::{ActionKind, Facing, ItemId, Pos};

fn report(stage: &Stage, max_expansions: u64) -> SearchReport {
    search_with_policy(
        &stage.initial_state(),
        stage,
        &SearchPolicy::with_max_expansions(max_expansions),
    )
}

fn found(report: &SearchReport) -> &ActionSequence {
    match &report.outcome {
        SearchOutcome::Found(actions) => actions,
        other => panic!("expected a solution, got {other:?}"),
    }
}

#[test]
fn open_room_solution_is_optimal_and_replays() {
    let allowed = [ActionKind::TurnLeft, ActionKind::TurnRight, ActionKind::Move, ActionKind::See];
    let stage = compile(open_config(5, 5, (0, 0), Facing::East, (4, 4), &allowed));
    let report = report(&stage, 10_000);
    let actions = found(&report);

    assert_eq!(actions.len(), 9);
    assert_eq!(actions.iter().filter(|a| **a == ActionKind::Move).count(), 8);
    assert!(actions.iter().all(|a| stage.allows(*a)));
    assert!(replay_actions(&stage, actions).is_ok());
}

#[test]
fn start_on_goal_needs_no_actions() {
    let stage = compile(open_config(3, 3, (1, 1), Facing::East, (1, 1), MOVE_AND_TURNS));
    assert_eq!(search(&stage.initial_state(), &stage), Some(Vec::new()));
}

#[test]
fn walled_off_goal_is_proven_unsolvable() {
    let mut config = open_config(5, 3, (0, 1), Facing::East, (4, 1), MOVE_AND_TURNS);
    config.board = config.board.with_walls(&[Pos::new(2, 0), Pos::new(2, 1), Pos::new(2, 2)]);
    config.max_turns = 12;
    let stage = compile(config);
    let report = report(&stage, 1_000_000);
    assert_eq!(report.outcome, SearchOutcome::Unsolvable);
    assert!(report.stats.expanded > 1);
    assert!(report.stats.terminal > 0);
    let fresh = report.stats.generated - report.stats.duplicates;
    assert_eq!(report.stats.visited as u64, fresh + 1);
}

#[test]
fn budget_of_one_reports_exhaustion_not_unsolvable() {
    let stage = compile(open_config(5, 5, (0, 0), Facing::East, (4, 4), MOVE_AND_TURNS));
    let report = report(&stage, 1);
    assert_eq!(report.outcome, SearchOutcome::Exhausted { limit: BudgetLimit::Nodes });
    assert_eq!(report.stats.expanded, 1);
}

#[test]
fn zero_time_budget_reports_time_exhaustion() {
    let stage = compile(open_config(5, 5, (0, 0), Facing::East, (4, 4), MOVE_AND_TURNS));
    let policy = SearchPolicy { max_expansions: 1_000, time_budget: Some(Duration::ZERO) };
    let report = search_with_policy(&stage.initial_state(), &stage, &policy);
    assert_eq!(report.outcome, SearchOutcome::Exhausted { limit: BudgetLimit::Time });
}

#[test]
fn required_item_is_collected_on_the_way() {
    let mut config = open_config(4, 3, (0, 0), Facing::East, (3, 0), ALL_ACTIONS);
    config.items.push(ItemConfig { id: ItemId("gem".into()), x: 1, y: 2, required: true });
    let stage = compile(config);
    let report = report(&stage, 50_000);
    let actions = found(&report);
    assert!(actions.contains(&ActionKind::Pickup));
    let trace = replay_actions(&stage, actions).expect("replay");
    assert!(trace.final_state().collected.contains(&ItemId("gem".into())));
}

#[test]
fn guard_blocking_corridor_is_fought_through() {
    let mut config = open_config(5, 1, (0, 0), Facing::East, (4, 0), ALL_ACTIONS);
    let mut guard = EnemyConfig::guard("g", 2, 0, Facing::North);
    guard.hp = 100;
    guard.attack = 0;
    config.enemies.push(guard);
    let stage = compile(config);

    let report = report(&stage, 50_000);
    let actions = found(&report);
    assert_eq!(actions.iter().filter(|a| **a == ActionKind::Attack).count(), 4);
    assert_eq!(actions.len(), 1 + 4 + 3);
}

#[test]
fn identical_inputs_give_identical_reports() {
    let stage = compile(patrol_lane_config());
    let first = report(&stage, 5_000);
    let second = report(&stage, 5_000);
    assert_eq!(first, second);
}

#[test]
fn heuristic_counts_distance_and_items() {
    let mut config = open_config(4, 4, (0, 0), Facing::East, (3, 3), ALL_ACTIONS);
    config.items.push(ItemConfig { id: ItemId("a".into()), x: 1, y: 1, required: true });
    config.items.push(ItemConfig { id: ItemId("b".into()), x: 2, y: 1, required: false });
    let stage = compile(config);
    assert_eq!(heuristic(&stage, &stage.initial_state()), 6 + ITEM_COST);
}

#[test]
fn auto_budget_is_clamped() {
    let small = compile(open_config(3, 3, (0, 0), Facing::East, (2, 2), MOVE_AND_TURNS));
    assert_eq!(auto_node_budget(&small), MIN_AUTO_NODE_BUDGET);

    let mut config = open_config(40, 40, (0, 0), Facing::East, (39, 39), ALL_ACTIONS);
    config.enemies.push(EnemyConfig::guard("g", 20, 20, Facing::North));
    let large = compile(config);
    assert_eq!(auto_node_budget(&large), MAX_AUTO_NODE_BUDGET);
}

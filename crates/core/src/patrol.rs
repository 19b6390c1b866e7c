//! Pattern-based solver for stages whose difficulty is timing against moving enemies.
//! This module exists because the joint state space of patrol phase and player position grows
//! too fast for exhaustive search on larger boards. It does not own any game rule: every plan is
//! driven and then re-verified through the transition function.
//!
//! Strategies are tried in a fixed order and each one either produces a verified action
//! sequence or a specific reason why it does not apply.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::replay::{ReplayError, replay_actions};
use crate::sim::movement::{astar_path, distances_from, neighbors, path_to_actions, rotation};
use crate::sim::{
    Stage, StepStatus, TransitionError, apply, attacks_required, can_see, cycle_poses, manhattan,
};
use crate::state::{CompositeState, EnemyState};
use crate::types::{ActionKind, ActionSequence, EnemyBehavior, EnemyId, Facing, Pos};

/// Upper bound on attacks tactical combat will plan against a single enemy.
pub const MAX_ATTACKS: u32 = 20;
/// Consecutive idle turns a plan may spend waiting for a blocked or watched cell to clear.
pub const MAX_IDLE_STREAK: u32 = 64;
/// Largest start delay timed wait will try, whatever the patrol periods are.
pub const MAX_TIMED_DELAY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    TacticalCombat,
    StealthBypass,
    TimedWait,
}

impl Strategy {
    pub const ALL: [Strategy; 3] =
        [Strategy::TacticalCombat, Strategy::StealthBypass, Strategy::TimedWait];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::TacticalCombat => "tactical combat",
            Strategy::StealthBypass => "stealth bypass",
            Strategy::TimedWait => "timed wait",
        }
    }

    /// Builds a candidate plan and accepts it only if replay reaches the goal on its last action.
    pub fn attempt(self, stage: &Stage) -> Result<ActionSequence, StrategyFailure> {
        let planned = match self {
            Strategy::TacticalCombat => tactical_combat(stage),
            Strategy::StealthBypass => stealth_bypass(stage),
            Strategy::TimedWait => timed_wait(stage),
        };
        let actions = planned.map_err(|reason| StrategyFailure { strategy: self, reason })?;
        replay_actions(stage, &actions)
            .map_err(|err| StrategyFailure { strategy: self, reason: err.into() })?;
        Ok(actions)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{strategy} failed: {reason}")]
pub struct StrategyFailure {
    pub strategy: Strategy,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("no enemy to engage")]
    NothingToEngage,
    #[error("the goal requires defeating every enemy")]
    EnemiesMustBeDefeated,
    #[error("neither `wait` nor `see` is allowed, so the player cannot hold position")]
    NoIdleAction,
    #[error("the player deals no damage")]
    NoDamage,
    #[error("enemy `{enemy}` needs {required} attacks, above the cap of {cap}")]
    TooManyAttacks { enemy: EnemyId, required: u32, cap: u32 },
    #[error("no staging cell next to enemy `{0}` stays out of sight")]
    NoStagingCell(EnemyId),
    #[error("enemy `{0}` never came within reach of the staging cell")]
    EnemyNeverArrived(EnemyId),
    #[error("enemy `{0}` moved out of reach mid-fight")]
    EnemySlipped(EnemyId),
    #[error("no static path to {0}")]
    Unreachable(Pos),
    #[error("the allowed turn actions cannot produce the needed facing")]
    CannotTurn,
    #[error("the player would be seen at {0}")]
    Exposed(Pos),
    #[error("the player stayed blocked at {0}")]
    Stalled(Pos),
    #[error("no start delay up to {0} turns gets through")]
    NoWorkingDelay(usize),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("plan failed verification: {0}")]
    Verification(#[from] ReplayError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySolution {
    pub strategy: Strategy,
    pub actions: ActionSequence,
}

/// Ordered strategy list. The first strategy whose plan verifies wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatrolValidator {
    strategies: Vec<Strategy>,
}

impl Default for PatrolValidator {
    fn default() -> Self {
        Self { strategies: Strategy::ALL.to_vec() }
    }
}

impl PatrolValidator {
    /// Returns the first verified solution, or every strategy's failure in order.
    pub fn solve(&self, stage: &Stage) -> Result<StrategySolution, Vec<StrategyFailure>> {
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            log::debug!("trying patrol strategy: {strategy}");
            match strategy.attempt(stage) {
                Ok(actions) => {
                    log::debug!("{strategy} solved the stage in {} action(s)", actions.len());
                    return Ok(StrategySolution { strategy: *strategy, actions });
                }
                Err(failure) => {
                    log::debug!("{failure}");
                    failures.push(failure);
                }
            }
        }
        Err(failures)
    }
}

/// Drives a plan through the transition function one action at a time, so every decision is
/// made against the real post-tick state.
struct Runner<'a> {
    stage: &'a Stage,
    state: CompositeState,
    actions: ActionSequence,
    done: bool,
}

impl<'a> Runner<'a> {
    fn new(stage: &'a Stage) -> Self {
        Self { stage, state: stage.initial_state(), actions: Vec::new(), done: false }
    }

    /// Independent copy that can be tried and thrown away.
    fn fork(&self) -> Runner<'a> {
        Runner { stage: self.stage, state: self.state.clone(), actions: Vec::new(), done: self.done }
    }

    fn absorb(&mut self, fork: Runner<'a>) {
        self.actions.extend(fork.actions);
        self.state = fork.state;
        self.done = fork.done;
    }

    fn commit(&mut self, action: ActionKind, state: CompositeState, status: StepStatus) {
        self.actions.push(action);
        self.state = state;
        self.done = status == StepStatus::GoalReached;
    }

    fn step(&mut self, action: ActionKind) -> Result<(), FailureReason> {
        let transition = apply(self.stage, &self.state, action)?;
        self.commit(action, transition.state, transition.status);
        Ok(())
    }

    fn idle(&mut self) -> Result<(), FailureReason> {
        self.step(idle_action(self.stage)?)
    }

    /// Executes `plan`, holding position whenever a move is blocked by an enemy or, when
    /// `stealthy`, whenever the next action would leave an enemy alert.
    fn follow(&mut self, plan: &[ActionKind], stealthy: bool) -> Result<(), FailureReason> {
        let mut idles = 0;
        let mut cursor = 0;
        while cursor < plan.len() && !self.done {
            let action = plan[cursor];
            let here = self.state.player.pos;
            let transition = apply(self.stage, &self.state, action)?;
            let stalled = action == ActionKind::Move && transition.state.player.pos == here;
            let exposed = stealthy && transition.state.any_alert();
            if !stalled && !exposed {
                self.commit(action, transition.state, transition.status);
                cursor += 1;
                idles = 0;
                continue;
            }

            if idles >= MAX_IDLE_STREAK {
                return Err(if exposed {
                    FailureReason::Exposed(here)
                } else {
                    FailureReason::Stalled(here)
                });
            }
            let idle = idle_action(self.stage)?;
            let waited = apply(self.stage, &self.state, idle)?;
            if stealthy && waited.state.any_alert() {
                return Err(FailureReason::Exposed(here));
            }
            self.commit(idle, waited.state, waited.status);
            idles += 1;
        }
        Ok(())
    }

    fn walk_to(&mut self, target: Pos, stealthy: bool) -> Result<(), FailureReason> {
        let path = astar_path(
            self.stage.board(),
            self.state.player.pos,
            target,
            &static_obstacles(&self.state),
        )
        .ok_or(FailureReason::Unreachable(target))?;
        let (plan, _) = path_to_actions(
            self.state.player.pos,
            self.state.player.facing,
            &path,
            self.stage.allows(ActionKind::TurnLeft),
            self.stage.allows(ActionKind::TurnRight),
        )
        .ok_or(FailureReason::CannotTurn)?;
        self.follow(&plan, stealthy)
    }

    fn face(&mut self, target: Pos) -> Result<(), FailureReason> {
        let wanted =
            Facing::toward(self.state.player.pos, target).ok_or(FailureReason::Unreachable(target))?;
        let turns = rotation(
            self.state.player.facing,
            wanted,
            self.stage.allows(ActionKind::TurnLeft),
            self.stage.allows(ActionKind::TurnRight),
        )
        .ok_or(FailureReason::CannotTurn)?;
        self.follow(&turns, false)
    }

    /// Collects every required item still on the board, in id order, then walks to the goal.
    fn finish_route(&mut self, stealthy: bool) -> Result<(), FailureReason> {
        let pending: Vec<Pos> = self
            .stage
            .required_items()
            .filter(|(id, _)| !self.state.collected.contains(*id))
            .map(|(_, item)| item.pos)
            .collect();
        for item in pending {
            self.walk_to(item, stealthy)?;
            if self.done {
                return Ok(());
            }
            self.follow(&[ActionKind::Pickup], stealthy)?;
        }
        if !self.done {
            self.walk_to(self.stage.goal(), stealthy)?;
        }
        Ok(())
    }
}

fn idle_action(stage: &Stage) -> Result<ActionKind, FailureReason> {
    [ActionKind::Wait, ActionKind::See]
        .into_iter()
        .find(|action| stage.allows(*action))
        .ok_or(FailureReason::NoIdleAction)
}

/// Guards never move, so they are the only enemies a static path must route around.
fn static_obstacles(state: &CompositeState) -> BTreeSet<Pos> {
    state
        .living_enemies()
        .filter(|enemy| enemy.behavior == EnemyBehavior::Guard)
        .map(|enemy| enemy.pos)
        .collect()
}

fn tactical_combat(stage: &Stage) -> Result<ActionSequence, FailureReason> {
    let initial = stage.initial_state();
    let targets: Vec<EnemyId> = stage
        .enemy_order()
        .iter()
        .filter(|id| {
            initial.enemy(id).is_some_and(|enemy| {
                stage.requires_all_enemies_defeated() || enemy.behavior == EnemyBehavior::Patrol
            })
        })
        .cloned()
        .collect();
    if targets.is_empty() {
        return Err(FailureReason::NothingToEngage);
    }

    let mut runner = Runner::new(stage);
    for target in &targets {
        if runner.done {
            break;
        }
        engage(&mut runner, target)?;
    }
    if !runner.done {
        runner.finish_route(false)?;
    }
    Ok(runner.actions)
}

fn engage(runner: &mut Runner<'_>, target: &EnemyId) -> Result<(), FailureReason> {
    let Some(enemy) = runner.state.enemy(target).filter(|enemy| !enemy.is_defeated()) else {
        return Ok(());
    };
    let required = attacks_required(enemy.hp, runner.state.player.attack)
        .ok_or(FailureReason::NoDamage)?;
    if required > MAX_ATTACKS {
        return Err(FailureReason::TooManyAttacks {
            enemy: target.clone(),
            required,
            cap: MAX_ATTACKS,
        });
    }

    let staging = staging_cells(runner.stage, &runner.state, target);
    let mut last_failure = FailureReason::NoStagingCell(target.clone());
    for (cell, anchor) in staging {
        let mut attempt = runner.fork();
        match ambush(&mut attempt, target, cell, anchor) {
            Ok(()) => {
                runner.absorb(attempt);
                return Ok(());
            }
            Err(reason) => {
                log::trace!("staging cell {cell} against `{target}` rejected: {reason}");
                last_failure = reason;
            }
        }
    }
    Err(last_failure)
}

/// Walks to `cell`, faces the route cell `anchor`, waits for the enemy to arrive and fights it.
fn ambush(
    runner: &mut Runner<'_>,
    target: &EnemyId,
    cell: Pos,
    anchor: Pos,
) -> Result<(), FailureReason> {
    runner.walk_to(cell, false)?;
    if runner.done {
        return Ok(());
    }
    runner.face(anchor)?;

    let patience = runner
        .state
        .enemy(target)
        .and_then(|enemy| enemy.patrol.as_ref())
        .map_or(1, |route| route.period() * 2 + 2);
    let mut waited = 0;
    let enemy_pos = loop {
        let Some(enemy) = living(&runner.state, target) else {
            return Ok(());
        };
        if manhattan(enemy.pos, runner.state.player.pos) == 1 {
            break enemy.pos;
        }
        if waited >= patience || runner.done {
            return Err(FailureReason::EnemyNeverArrived(target.clone()));
        }
        runner.idle()?;
        waited += 1;
    };

    runner.face(enemy_pos)?;
    for _ in 0..MAX_ATTACKS {
        let Some(enemy) = living(&runner.state, target) else {
            return Ok(());
        };
        if runner.state.player.pos.step(runner.state.player.facing) != enemy.pos {
            return Err(FailureReason::EnemySlipped(target.clone()));
        }
        runner.step(ActionKind::Attack)?;
        if runner.done {
            return Ok(());
        }
    }
    match living(&runner.state, target) {
        Some(_) => Err(FailureReason::EnemySlipped(target.clone())),
        None => Ok(()),
    }
}

fn living<'s>(state: &'s CompositeState, id: &EnemyId) -> Option<&'s EnemyState> {
    state.enemy(id).filter(|enemy| !enemy.is_defeated())
}

/// Open cells next to the target's route that the target only ever sees from point-blank range
/// and no other enemy ever sees. Each comes with the adjacent route cell to face while waiting.
/// Nearest cells first.
fn staging_cells(stage: &Stage, state: &CompositeState, target: &EnemyId) -> Vec<(Pos, Pos)> {
    let board = stage.board();
    let Some(enemy) = living(state, target) else {
        return Vec::new();
    };
    let target_poses = cycle_poses(board, enemy);
    let others: Vec<(EnemyState, Vec<(Pos, Facing)>)> = state
        .living_enemies()
        .filter(|other| other.id != *target)
        .map(|other| (other.clone(), cycle_poses(board, other)))
        .collect();

    let mut occupied: BTreeSet<Pos> = target_poses.iter().map(|(pos, _)| *pos).collect();
    for (_, poses) in &others {
        occupied.extend(poses.iter().map(|(pos, _)| *pos));
    }
    let distances = distances_from(board, state.player.pos, &static_obstacles(state));

    let mut candidates: Vec<(u32, Pos, Pos)> = Vec::new();
    for route_cell in target_poses.iter().map(|(pos, _)| *pos).collect::<BTreeSet<_>>() {
        for cell in neighbors(route_cell) {
            if occupied.contains(&cell) || candidates.iter().any(|(_, seen, _)| *seen == cell) {
                continue;
            }
            let Some(distance) = distances.get(&cell).copied() else {
                continue;
            };
            let spotted_early = target_poses.iter().any(|(pos, facing)| {
                can_see(board, *pos, *facing, enemy.vision_range, cell) && manhattan(*pos, cell) != 1
            });
            let spotted_by_other = others.iter().any(|(other, poses)| {
                poses.iter().any(|(pos, facing)| can_see(board, *pos, *facing, other.vision_range, cell))
            });
            if !spotted_early && !spotted_by_other {
                candidates.push((distance, cell, route_cell));
            }
        }
    }
    candidates.sort_by_key(|(distance, cell, _)| (*distance, *cell));
    candidates.into_iter().map(|(_, cell, anchor)| (cell, anchor)).collect()
}

fn stealth_bypass(stage: &Stage) -> Result<ActionSequence, FailureReason> {
    if stage.requires_all_enemies_defeated() && !stage.enemy_order().is_empty() {
        return Err(FailureReason::EnemiesMustBeDefeated);
    }
    let mut runner = Runner::new(stage);
    runner.finish_route(true)?;
    Ok(runner.actions)
}

/// The plain static route: shortest legs through every required item to the goal.
fn plain_route(stage: &Stage) -> Result<ActionSequence, FailureReason> {
    let state = stage.initial_state();
    let obstacles = static_obstacles(&state);
    let can_left = stage.allows(ActionKind::TurnLeft);
    let can_right = stage.allows(ActionKind::TurnRight);

    let mut stops: Vec<(Pos, bool)> =
        stage.required_items().map(|(_, item)| (item.pos, true)).collect();
    stops.push((stage.goal(), false));

    let mut actions = Vec::new();
    let (mut pos, mut facing) = (state.player.pos, state.player.facing);
    for (stop, pickup) in stops {
        let path = astar_path(stage.board(), pos, stop, &obstacles)
            .ok_or(FailureReason::Unreachable(stop))?;
        let (leg, end_facing) =
            path_to_actions(pos, facing, &path, can_left, can_right).ok_or(FailureReason::CannotTurn)?;
        actions.extend(leg);
        if pickup {
            actions.push(ActionKind::Pickup);
        }
        pos = stop;
        facing = end_facing;
    }
    Ok(actions)
}

fn timed_wait(stage: &Stage) -> Result<ActionSequence, FailureReason> {
    if stage.requires_all_enemies_defeated() && !stage.enemy_order().is_empty() {
        return Err(FailureReason::EnemiesMustBeDefeated);
    }
    let route = plain_route(stage)?;
    if replay_actions(stage, &route).is_ok() {
        return Ok(route);
    }

    let idle = idle_action(stage)?;
    let max_delay = max_start_delay(&stage.initial_state());
    for delay in 1..=max_delay {
        let mut actions = vec![idle; delay];
        actions.extend(route.iter().copied());
        if replay_actions(stage, &actions).is_ok() {
            return Ok(actions);
        }
    }
    Err(FailureReason::NoWorkingDelay(max_delay))
}

/// One full joint cycle of every patrol, capped.
fn max_start_delay(state: &CompositeState) -> usize {
    state
        .living_enemies()
        .filter_map(|enemy| enemy.patrol.as_ref())
        .map(|route| route.period())
        .fold(1, lcm)
        .min(MAX_TIMED_DELAY)
}

fn lcm(a: usize, b: usize) -> usize {
    fn gcd(a: usize, b: usize) -> usize {
        if b == 0 { a } else { gcd(b, a % b) }
    }
    if a == 0 || b == 0 {
        return a.max(b);
    }
    (a / gcd(a, b)).saturating_mul(b)
}

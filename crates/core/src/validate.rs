//! The `validate` entry point: structural gate, patrol strategies, general search, replay check.
//! This module exists to turn one stage configuration into one self-describing verdict.
//! It does not own any game rule; every solution it reports has been re-simulated first.

use std::fmt::Write;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::analysis::{SolutionAnalysis, analyze};
use crate::codegen::{SolutionCode, synthesize};
use crate::config::{StageConfiguration, ValidationOptions};
use crate::patrol::{PatrolValidator, Strategy};
use crate::replay::replay_actions;
use crate::search::{BudgetLimit, SearchOutcome, SearchPolicy, SearchStats, search_with_policy};
use crate::sim::Stage;
use crate::types::{ActionKind, ActionSequence};

/// Which engine produced the reported solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "strategy", rename_all = "snake_case")]
pub enum Solver {
    Search,
    Patrol(Strategy),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The configuration never reached the simulator.
    Structural,
    /// The whole reachable state space was expanded without reaching the goal.
    Unsolvable,
    /// A budget ran out first. Retrying with a larger budget may still succeed.
    Exhausted { limit: BudgetLimit },
    /// A candidate solution did not survive replay.
    Verification,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationResult {
    pub success: bool,
    pub path_found: bool,
    /// Distinct action kinds the solution uses, in first-use order.
    pub required_actions: Vec<ActionKind>,
    /// Cells walked: the number of `move` actions.
    pub solution_length: usize,
    pub action_count: usize,
    pub solution: ActionSequence,
    pub solver: Option<Solver>,
    pub analysis: Option<SolutionAnalysis>,
    pub code: Option<SolutionCode>,
    pub failure: Option<FailureKind>,
    pub error: Option<String>,
    /// One entry per structural violation.
    pub issues: Vec<String>,
    /// Why each patrol strategy declined, in the order they were tried.
    pub strategy_failures: Vec<String>,
    /// SHA-256 of the stage configuration's JSON form, lowercase hex.
    pub stage_digest: String,
    pub final_fingerprint: Option<u64>,
    pub search: Option<SearchStats>,
}

impl ValidationResult {
    fn pending(stage_digest: String) -> Self {
        Self {
            success: false,
            path_found: false,
            required_actions: Vec::new(),
            solution_length: 0,
            action_count: 0,
            solution: Vec::new(),
            solver: None,
            analysis: None,
            code: None,
            failure: None,
            error: None,
            issues: Vec::new(),
            strategy_failures: Vec::new(),
            stage_digest,
            final_fingerprint: None,
            search: None,
        }
    }

    fn fail(mut self, kind: FailureKind, reason: String) -> Self {
        log::info!("validation failed: {reason}");
        self.success = false;
        self.failure = Some(kind);
        self.error = Some(reason);
        self
    }

    fn accept(
        mut self,
        stage: &Stage,
        solver: Solver,
        actions: ActionSequence,
        options: &ValidationOptions,
    ) -> Self {
        self.path_found = true;
        self.solver = Some(solver);
        let trace = match replay_actions(stage, &actions) {
            Ok(trace) => trace,
            Err(err) => {
                self.solution = actions;
                return self.fail(FailureKind::Verification, err.to_string());
            }
        };

        let mut required = Vec::new();
        for action in &actions {
            if !required.contains(action) {
                required.push(*action);
            }
        }

        self.success = true;
        self.required_actions = required;
        self.solution_length = actions.iter().filter(|a| **a == ActionKind::Move).count();
        self.action_count = actions.len();
        self.final_fingerprint = Some(trace.final_fingerprint());
        if options.include_analysis {
            self.analysis = Some(analyze(stage, &actions));
        }
        if options.include_code {
            self.code = Some(synthesize(&actions));
        }
        self.solution = actions;
        log::info!(
            "validation succeeded via {solver:?}: {} action(s), {} move(s)",
            self.action_count,
            self.solution_length
        );
        self
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.failure, Some(FailureKind::Exhausted { .. }))
    }

    /// Multi-line human-readable report.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "stage {}", self.stage_digest);
        if self.success {
            let solver = match self.solver {
                Some(Solver::Patrol(strategy)) => strategy.name(),
                Some(Solver::Search) | None => "search",
            };
            let _ = writeln!(
                out,
                "solvable via {solver}: {} action(s), {} move(s)",
                self.action_count, self.solution_length
            );
            let names: Vec<&str> = self.required_actions.iter().map(|a| a.api_name()).collect();
            let _ = writeln!(out, "actions used: {}", names.join(", "));
            if let Some(analysis) = &self.analysis {
                let _ = writeln!(
                    out,
                    "efficiency {:.2} ({:?}), minimum {}",
                    analysis.efficiency_ratio, analysis.quality, analysis.theoretical_minimum
                );
            }
        } else {
            let _ = writeln!(out, "not validated: {}", self.error.as_deref().unwrap_or("unknown"));
            for issue in &self.issues {
                let _ = writeln!(out, "  - {issue}");
            }
        }
        for failure in &self.strategy_failures {
            let _ = writeln!(out, "  strategy: {failure}");
        }
        if let Some(stats) = &self.search {
            let _ = writeln!(
                out,
                "search: {} expanded, {} generated, {} duplicate(s), {} visited, frontier peak {}",
                stats.expanded, stats.generated, stats.duplicates, stats.visited, stats.high_water
            );
        }
        out
    }
}

pub fn stage_digest(config: &StageConfiguration) -> String {
    let bytes = serde_json::to_vec(config).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

pub fn policy_for(stage: &Stage, options: &ValidationOptions) -> SearchPolicy {
    let mut policy = match options.node_budget {
        Some(nodes) => SearchPolicy::with_max_expansions(nodes),
        None => SearchPolicy::auto(stage),
    };
    policy.time_budget = options.time_budget_ms.map(Duration::from_millis);
    policy
}

/// Validates one stage. Never panics on bad input: every failure lands in the result.
pub fn validate(config: &StageConfiguration, options: &ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::pending(stage_digest(config));

    let stage = match Stage::compile(config) {
        Ok(stage) => stage,
        Err(err) => {
            result.issues = err.issues().iter().map(ToString::to_string).collect();
            return result.fail(FailureKind::Structural, err.to_string());
        }
    };

    if options.use_patrol_validator && stage.has_patrols() {
        match PatrolValidator::default().solve(&stage) {
            Ok(solution) => {
                return result.accept(
                    &stage,
                    Solver::Patrol(solution.strategy),
                    solution.actions,
                    options,
                );
            }
            Err(failures) => {
                log::debug!("patrol strategies declined, falling back to search");
                result.strategy_failures = failures.iter().map(ToString::to_string).collect();
            }
        }
    }

    let report = search_with_policy(&stage.initial_state(), &stage, &policy_for(&stage, options));
    let expanded = report.stats.expanded;
    result.search = Some(report.stats);
    match report.outcome {
        SearchOutcome::Found(actions) => result.accept(&stage, Solver::Search, actions, options),
        SearchOutcome::Unsolvable => {
            let reason = format!(
                "no action sequence reaches the goal within {} turns",
                stage.max_turns()
            );
            result.fail(FailureKind::Unsolvable, reason)
        }
        SearchOutcome::Exhausted { limit } => {
            let reason = format!(
                "search hit its {limit} budget after {expanded} expansion(s) without a verdict"
            );
            result.fail(FailureKind::Exhausted { limit }, reason)
        }
    }
}

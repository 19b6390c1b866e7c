//! Independent re-simulation of a candidate action sequence.
//! This module exists to turn a claimed solution into a checked trace through `apply`.
//! It does not own how solutions are found; search and the patrol strategies do that.

use thiserror::Error;

use crate::sim::{Stage, StepStatus, TransitionError, apply};
use crate::state::CompositeState;
use crate::types::{ActionKind, ActionSequence};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("step {step} (`{action}`) was rejected: {source}")]
    Rejected { step: usize, action: ActionKind, source: TransitionError },
    #[error("goal reached after step {step} but {remaining} action(s) were left over")]
    TrailingActions { step: usize, remaining: usize },
    #[error("sequence of {actions} action(s) ended without reaching the goal")]
    NotAtGoal { actions: usize },
}

/// A fully re-simulated solution: `states[0]` is the initial state and `states[i + 1]` follows
/// `actions[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionTrace {
    pub actions: ActionSequence,
    pub states: Vec<CompositeState>,
}

impl SolutionTrace {
    pub fn final_state(&self) -> &CompositeState {
        // `states` always holds at least the initial state.
        &self.states[self.states.len() - 1]
    }

    pub fn final_fingerprint(&self) -> u64 {
        self.final_state().fingerprint()
    }
}

/// Re-runs `actions` from the stage's initial state through the transition function and
/// accepts them only when the last action, and no earlier one, reaches the goal. A stage that
/// starts on its goal is solved by the empty sequence.
pub fn replay_actions(stage: &Stage, actions: &[ActionKind]) -> Result<SolutionTrace, ReplayError> {
    let mut states = Vec::with_capacity(actions.len() + 1);
    states.push(stage.initial_state());
    if actions.is_empty() && stage.is_goal(&states[0]) {
        return Ok(SolutionTrace { actions: Vec::new(), states });
    }

    for (step, action) in actions.iter().copied().enumerate() {
        let current = &states[states.len() - 1];
        let transition = apply(stage, current, action)
            .map_err(|source| ReplayError::Rejected { step, action, source })?;
        let reached = transition.status == StepStatus::GoalReached;
        states.push(transition.state);
        if reached {
            let remaining = actions.len() - step - 1;
            if remaining > 0 {
                return Err(ReplayError::TrailingActions { step, remaining });
            }
            return Ok(SolutionTrace { actions: actions.to_vec(), states });
        }
    }

    Err(ReplayError::NotAtGoal { actions: actions.len() })
}

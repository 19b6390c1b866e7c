//! Stage validation engine: compiles a stage configuration, searches it for a winning action
//! sequence, re-verifies that sequence through the transition function and reports the outcome.
//!
//! [`validate`] is the entry point; [`apply`] is the single transition function every solver
//! and the replay check go through.

pub mod analysis;
pub mod board;
pub mod codegen;
pub mod config;
pub mod error;
pub mod patrol;
pub mod prevalidate;
pub mod replay;
pub mod search;
pub mod sim;
pub mod state;
pub mod types;
pub mod validate;

pub use config::{StageConfiguration, ValidationOptions};
pub use error::StageError;
pub use replay::{ReplayError, SolutionTrace, replay_actions};
pub use search::{SearchOutcome, SearchPolicy, SearchReport, search, search_with_policy};
pub use sim::{Stage, Transition, TransitionError, apply};
pub use state::CompositeState;
pub use types::*;
pub use validate::{FailureKind, Solver, ValidationResult, validate};

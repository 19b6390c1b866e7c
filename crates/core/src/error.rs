//! Error type for stage compilation.
//! This module exists to wrap structural issues in one `Error` the caller can propagate with `?`.
//! It does not own the checks themselves; `prevalidate` does.

use thiserror::Error;

use crate::prevalidate::StructuralIssue;

/// Hard failures that stop a validation attempt before any search runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("stage is structurally invalid ({} issue(s)): {}", .0.len(), join_issues(.0))]
    Structural(Vec<StructuralIssue>),
}

impl StageError {
    pub fn issues(&self) -> &[StructuralIssue] {
        match self {
            StageError::Structural(issues) => issues,
        }
    }
}

fn join_issues(issues: &[StructuralIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of one job within a run.
///
/// Moves only forward: Pending -> Running -> Succeeded | Failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum JobOutcome {
    Pending,
    Running,
    Succeeded,
    /// Carries the full captured output of the failed attempt.
    Failed(String),
}

impl JobOutcome {
    /// Whether `next` is a legal successor of this outcome.
    pub fn can_advance_to(&self, next: &JobOutcome) -> bool {
        matches!(
            (self, next),
            (JobOutcome::Pending, JobOutcome::Running)
                | (JobOutcome::Running, JobOutcome::Succeeded)
                | (JobOutcome::Running, JobOutcome::Failed(_))
        )
    }

    /// Replaces `self` with `next` if the move is legal. An illegal move
    /// leaves `self` untouched and hands `next` back.
    pub fn advance(&mut self, next: JobOutcome) -> Result<(), JobOutcome> {
        if self.can_advance_to(&next) {
            *self = next;
            Ok(())
        } else {
            Err(next)
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Pending => write!(f, "Pending"),
            JobOutcome::Running => write!(f, "Running"),
            JobOutcome::Succeeded => write!(f, "Succeeded"),
            JobOutcome::Failed(_) => write!(f, "Failed"),
        }
    }
}

/// The failure surfaced for a run: which job, and everything it printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub job: String,
    pub detail: String,
}

/// Overall verdict of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrchestrationResult {
    Success,
    Failure(JobFailure),
}

impl OrchestrationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OrchestrationResult::Success)
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            OrchestrationResult::Success => None,
            OrchestrationResult::Failure(failure) => Some(failure),
        }
    }
}

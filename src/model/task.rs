use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Lifecycle of a single install/uninstall task.
///
/// Transitions only move forward: `Pending → Running → {Complete, Failed, Skipped}`,
/// plus `Pending → Skipped` for optional tasks whose prerequisite is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Complete,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Skipped)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Complete => "OK",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }

    fn can_become(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Skipped)
                | (Self::Running, Self::Complete)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Skipped)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task {task}: cannot move from {} to {}", .from.label(), .to.label())]
pub struct TransitionError {
    pub task: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Structured cause of a task failure, assigned when the error is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    SpawnFailed,
    NonZeroExit(Option<i32>),
    NoModelsFound,
    AgentUnavailable,
    InvalidConfig,
    Filesystem,
    /// The runner stopped before reporting an outcome.
    Unreported,
}

impl FailureReason {
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::NoModelsFound => Some("Hint: Run with --debug to see raw cursor-agent output"),
            Self::AgentUnavailable => Some("Hint: Ensure cursor-agent is installed and logged in"),
            _ => None,
        }
    }
}

/// Failure details attached to exactly one failed task.
#[derive(Debug, Clone, Error)]
#[error("{message}: {cause}")]
pub struct ExecError {
    message: String,
    raw_output: String,
    cause: String,
    reason: FailureReason,
    log_file: Option<PathBuf>,
}

impl ExecError {
    pub fn new(
        message: impl Into<String>,
        raw_output: impl Into<String>,
        cause: impl fmt::Display,
        reason: FailureReason,
    ) -> Self {
        Self {
            message: message.into(),
            raw_output: raw_output.into(),
            cause: cause.to_string(),
            reason,
            log_file: None,
        }
    }

    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn raw_output(&self) -> &str {
        &self.raw_output
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    pub fn reason(&self) -> FailureReason {
        self.reason
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.reason.hint()
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub optional: bool,
    status: TaskStatus,
    error: Option<ExecError>,
}

impl Task {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            optional: false,
            status: TaskStatus::Pending,
            error: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ExecError> {
        self.error.as_ref()
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Running)
    }

    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Complete)
    }

    pub fn skip(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Skipped)
    }

    pub fn fail(&mut self, error: ExecError) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Failed)?;
        self.error = Some(error);
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> Result<(), TransitionError> {
        if !self.status.can_become(next) {
            return Err(TransitionError {
                task: self.name.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// A run fails critically iff a non-optional task failed.
pub fn has_critical_failure(tasks: &[Task]) -> bool {
    tasks
        .iter()
        .any(|task| task.status() == TaskStatus::Failed && !task.optional)
}

pub fn all_terminal(tasks: &[Task]) -> bool {
    tasks.iter().all(|task| task.status().is_terminal())
}

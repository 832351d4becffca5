pub mod action;
pub mod host_config;
pub mod log;
pub mod models;
pub mod plan;

use crate::model::task::{ExecError, Task, TransitionError};

pub use log::RunLog;
pub use plan::{PlanContext, TaskPlan, install_plan, uninstall_plan};

#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Complete,
    Failed(ExecError),
    Skipped,
}

/// Progress reported by the runner, in execution order.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    Started(usize),
    Finished { index: usize, outcome: TaskOutcome },
}

/// Executes task plans strictly in order, one at a time.
///
/// Every task is attempted no matter how earlier ones ended; only an optional
/// task with a missing prerequisite is skipped. No retries.
#[derive(Debug, Default)]
pub struct TaskRunner {
    log: Option<RunLog>,
}

impl TaskRunner {
    pub fn new(log: Option<RunLog>) -> Self {
        Self { log }
    }

    pub fn log_path(&self) -> Option<std::path::PathBuf> {
        self.log.as_ref().map(|log| log.path().to_path_buf())
    }

    pub fn run(&mut self, plans: &[TaskPlan], mut emit: impl FnMut(TaskEvent)) {
        for (index, plan) in plans.iter().enumerate() {
            let missing = plan
                .prerequisite
                .as_ref()
                .filter(|needs| plan.task.optional && !needs.is_met());
            if let Some(needs) = missing {
                let reason = needs.describe();
                tracing::info!("skipping {}: {reason}", plan.task.name);
                if let Some(log) = self.log.as_mut() {
                    log.skipped(&plan.task.name, &reason);
                }
                emit(TaskEvent::Finished {
                    index,
                    outcome: TaskOutcome::Skipped,
                });
                continue;
            }

            emit(TaskEvent::Started(index));
            let outcome = self.execute(plan);
            emit(TaskEvent::Finished { index, outcome });
        }
    }

    fn execute(&mut self, plan: &TaskPlan) -> TaskOutcome {
        let command_line = plan.action.command_line();
        if let Some(log) = self.log.as_mut() {
            log.running(&command_line);
        }

        let result = plan.action.perform();
        let raw = match &result {
            Ok(output) => output,
            Err(failure) => &failure.output,
        };
        tracing::debug!("{command_line} output:\n{raw}");

        match result {
            Ok(output) => {
                if let Some(log) = self.log.as_mut() {
                    log.output(&output);
                    log.success();
                }
                tracing::info!("task {} complete", plan.task.name);
                TaskOutcome::Complete
            }
            Err(failure) => {
                if let Some(log) = self.log.as_mut() {
                    log.output(&failure.output);
                    log.error(&failure.cause);
                }
                tracing::warn!("task {} failed: {}", plan.task.name, failure.cause);
                let error = ExecError::new(
                    format!("{} failed", plan.task.name),
                    failure.output,
                    failure.cause,
                    failure.reason,
                )
                .with_log_file(self.log_path());
                TaskOutcome::Failed(error)
            }
        }
    }
}

/// Apply a runner event to the task list it was produced for.
pub fn apply_event(tasks: &mut [Task], event: TaskEvent) -> Result<(), TransitionError> {
    let (index, outcome) = match event {
        TaskEvent::Started(index) => {
            return tasks.get_mut(index).map_or(Ok(()), Task::start);
        }
        TaskEvent::Finished { index, outcome } => (index, outcome),
    };

    let Some(task) = tasks.get_mut(index) else {
        return Ok(());
    };
    match outcome {
        TaskOutcome::Complete => task.complete(),
        TaskOutcome::Failed(error) => task.fail(error),
        TaskOutcome::Skipped => task.skip(),
    }
}

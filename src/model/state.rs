use std::path::PathBuf;

use super::check::{CheckResult, can_proceed};
use super::task::{Task, has_critical_failure};

/// Installer wizard screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    /// Preflight checks and the install/uninstall choice.
    #[default]
    Welcome,
    Installing,
    Uninstalling,
    /// Summary; never left except by exiting.
    Complete,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Welcome => "WELCOME",
            Step::Installing => "INSTALLING",
            Step::Uninstalling => "UNINSTALLING",
            Step::Complete => "COMPLETE",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Step::Installing | Step::Uninstalling)
    }
}

#[derive(Debug, Clone)]
pub struct InstallerState {
    pub step: Step,
    pub checks: Vec<CheckResult>,
    pub tasks: Vec<Task>,
    pub existing_setup: bool,
    pub is_uninstall: bool,
    pub plugin_link: PathBuf,
    pub config_path: PathBuf,
}

impl InstallerState {
    pub fn can_proceed(&self) -> bool {
        can_proceed(&self.checks)
    }

    pub fn has_critical_failure(&self) -> bool {
        has_critical_failure(&self.tasks)
    }

    pub fn action_label(&self) -> &'static str {
        if self.is_uninstall {
            "Uninstallation"
        } else {
            "Installation"
        }
    }
}

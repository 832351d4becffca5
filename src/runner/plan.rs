use std::path::PathBuf;

use super::action::{CommandSpec, TaskAction};
use super::host_config;
use crate::detect::{InstallPaths, PackageManager};
use crate::model::config::InstallerConfig;
use crate::model::task::Task;

/// Something an optional task needs before it is worth attempting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    Binary(String),
    File(PathBuf),
}

impl Prerequisite {
    pub fn is_met(&self) -> bool {
        match self {
            Prerequisite::Binary(name) => which::which(name).is_ok(),
            Prerequisite::File(path) => path.exists(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Prerequisite::Binary(name) => format!("{name} not found"),
            Prerequisite::File(path) => format!("{} not found", path.display()),
        }
    }
}

/// A task plus the work behind it.
#[derive(Debug, Clone)]
pub struct TaskPlan {
    pub task: Task,
    pub action: TaskAction,
    /// Only consulted for optional tasks.
    pub prerequisite: Option<Prerequisite>,
}

impl TaskPlan {
    fn required(name: &str, description: &str, action: TaskAction) -> Self {
        Self {
            task: Task::new(name, description),
            action,
            prerequisite: None,
        }
    }

    fn optional(name: &str, description: &str, action: TaskAction, needs: Prerequisite) -> Self {
        Self {
            task: Task::new(name, description).optional(),
            action,
            prerequisite: Some(needs),
        }
    }
}

pub struct PlanContext<'a> {
    pub config: &'a InstallerConfig,
    pub paths: &'a InstallPaths,
    pub project_dir: PathBuf,
    pub package_manager: PackageManager,
}

pub fn install_plan(ctx: &PlanContext<'_>) -> Vec<TaskPlan> {
    let pm = ctx.package_manager.program();
    let plugin = &ctx.config.plugin;
    let agent = &ctx.config.agent.binary;
    let config_path = ctx.paths.config_path.clone();

    vec![
        TaskPlan::required(
            "Install dependencies",
            &format!("Installing dependencies with {pm}..."),
            TaskAction::Command(CommandSpec::new(pm, ["install"]).in_dir(&ctx.project_dir)),
        ),
        TaskPlan::required(
            "Build plugin",
            "Building plugin...",
            TaskAction::Command(CommandSpec::new(pm, ["run", "build"]).in_dir(&ctx.project_dir)),
        ),
        TaskPlan::required(
            "Link plugin",
            "Linking plugin into OpenCode...",
            TaskAction::Link {
                target: ctx.project_dir.join(&plugin.entry),
                link: ctx.paths.plugin_link.clone(),
            },
        ),
        TaskPlan::optional(
            "Install AI SDK",
            &format!("Installing {}...", plugin.npm_package),
            TaskAction::Command(CommandSpec::new(
                "npm",
                [
                    "install".to_string(),
                    "--prefix".to_string(),
                    ctx.paths.host_dir.display().to_string(),
                    plugin.npm_package.clone(),
                ],
            )),
            Prerequisite::Binary("npm".to_string()),
        ),
        TaskPlan::required(
            "Configure provider",
            "Updating OpenCode config...",
            TaskAction::MergeProvider {
                config_path: config_path.clone(),
                provider_key: plugin.provider_key.clone(),
                entry: host_config::provider_entry(plugin),
            },
        ),
        TaskPlan::optional(
            "Discover models",
            &format!("Querying {agent} for models..."),
            TaskAction::DiscoverModels {
                agent: CommandSpec::new(agent.as_str(), ["models"]),
                config_path: config_path.clone(),
                provider_key: plugin.provider_key.clone(),
            },
            Prerequisite::Binary(agent.clone()),
        ),
        TaskPlan::required(
            "Validate config",
            "Validating config...",
            TaskAction::ValidateConfig { config_path },
        ),
    ]
}

pub fn uninstall_plan(ctx: &PlanContext<'_>) -> Vec<TaskPlan> {
    let config_path = ctx.paths.config_path.clone();

    vec![
        TaskPlan::required(
            "Remove plugin link",
            "Removing plugin symlink...",
            TaskAction::Unlink {
                link: ctx.paths.plugin_link.clone(),
            },
        ),
        TaskPlan::required(
            "Remove provider",
            "Removing provider from config...",
            TaskAction::RemoveProvider {
                config_path: config_path.clone(),
                provider_key: ctx.config.plugin.provider_key.clone(),
            },
        ),
        TaskPlan::optional(
            "Validate config",
            "Validating config...",
            TaskAction::ValidateConfig {
                config_path: config_path.clone(),
            },
            Prerequisite::File(config_path),
        ),
    ]
}

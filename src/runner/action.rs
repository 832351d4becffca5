use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::Value;

use super::host_config::{self, HostConfigError};
use super::models::parse_models;
use crate::model::task::FailureReason;

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Run to completion, capturing stdout followed by stderr.
    fn run(&self) -> Result<String, ActionFailure> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|err| ActionFailure {
            output: String::new(),
            cause: format!("failed to start {}: {err}", self.program),
            reason: FailureReason::SpawnFailed,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ActionFailure {
                cause: output.status.to_string(),
                reason: classify_output(&combined, output.status.code()),
                output: combined,
            })
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

fn classify_output(output: &str, code: Option<i32>) -> FailureReason {
    if output.to_lowercase().contains("no models found") {
        FailureReason::NoModelsFound
    } else {
        FailureReason::NonZeroExit(code)
    }
}

/// What went wrong inside an action, before it is tied to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub output: String,
    pub cause: String,
    pub reason: FailureReason,
}

impl ActionFailure {
    fn fs(cause: impl fmt::Display) -> Self {
        Self {
            output: String::new(),
            cause: cause.to_string(),
            reason: FailureReason::Filesystem,
        }
    }
}

impl From<HostConfigError> for ActionFailure {
    fn from(err: HostConfigError) -> Self {
        let reason = match err {
            HostConfigError::Io { .. } => FailureReason::Filesystem,
            _ => FailureReason::InvalidConfig,
        };
        Self {
            output: String::new(),
            cause: err.to_string(),
            reason,
        }
    }
}

/// One unit of install or uninstall work.
#[derive(Debug, Clone)]
pub enum TaskAction {
    Command(CommandSpec),
    /// Point `link` at `target`, replacing whatever is at `link`.
    Link { target: PathBuf, link: PathBuf },
    /// Remove `link`; an absent link is fine.
    Unlink { link: PathBuf },
    MergeProvider {
        config_path: PathBuf,
        provider_key: String,
        entry: Value,
    },
    RemoveProvider {
        config_path: PathBuf,
        provider_key: String,
    },
    /// Ask the agent CLI for its models and record them under the provider.
    DiscoverModels {
        agent: CommandSpec,
        config_path: PathBuf,
        provider_key: String,
    },
    ValidateConfig { config_path: PathBuf },
}

impl TaskAction {
    /// Human-readable invocation, as written to the run log.
    pub fn command_line(&self) -> String {
        match self {
            TaskAction::Command(spec) => spec.to_string(),
            TaskAction::Link { target, link } => {
                format!("ln -sf {} {}", target.display(), link.display())
            }
            TaskAction::Unlink { link } => format!("rm -f {}", link.display()),
            TaskAction::MergeProvider {
                config_path,
                provider_key,
                ..
            } => format!("merge provider.{provider_key} into {}", config_path.display()),
            TaskAction::RemoveProvider {
                config_path,
                provider_key,
            } => format!("remove provider.{provider_key} from {}", config_path.display()),
            TaskAction::DiscoverModels { agent, .. } => agent.to_string(),
            TaskAction::ValidateConfig { config_path } => {
                format!("validate {}", config_path.display())
            }
        }
    }

    /// Perform the action, returning the output to log.
    pub fn perform(&self) -> Result<String, ActionFailure> {
        match self {
            TaskAction::Command(spec) => spec.run(),
            TaskAction::Link { target, link } => {
                if !target.exists() {
                    return Err(ActionFailure::fs(format!(
                        "{} does not exist (was the plugin built?)",
                        target.display()
                    )));
                }
                remove_link(link).map_err(ActionFailure::fs)?;
                if let Some(parent) = link.parent() {
                    fs::create_dir_all(parent).map_err(ActionFailure::fs)?;
                }
                std::os::unix::fs::symlink(target, link).map_err(ActionFailure::fs)?;
                Ok(format!("{} -> {}", link.display(), target.display()))
            }
            TaskAction::Unlink { link } => {
                let removed = remove_link(link).map_err(ActionFailure::fs)?;
                Ok(if removed {
                    format!("removed {}", link.display())
                } else {
                    format!("{} not present", link.display())
                })
            }
            TaskAction::MergeProvider {
                config_path,
                provider_key,
                entry,
            } => {
                let mut config = host_config::read(config_path)?;
                host_config::merge_provider(&mut config, provider_key, entry.clone());
                host_config::write(config_path, &config)?;
                Ok(format!("provider.{provider_key} written"))
            }
            TaskAction::RemoveProvider {
                config_path,
                provider_key,
            } => {
                if !config_path.exists() {
                    return Ok(format!("{} not present", config_path.display()));
                }
                let mut config = host_config::read(config_path)?;
                if !host_config::remove_provider(&mut config, provider_key) {
                    return Ok(format!("provider.{provider_key} not configured"));
                }
                host_config::write(config_path, &config)?;
                Ok(format!("provider.{provider_key} removed"))
            }
            TaskAction::DiscoverModels {
                agent,
                config_path,
                provider_key,
            } => discover_models(agent, config_path, provider_key),
            TaskAction::ValidateConfig { config_path } => {
                host_config::validate(config_path)?;
                Ok(format!("{} is valid JSON", config_path.display()))
            }
        }
    }
}

fn discover_models(
    agent: &CommandSpec,
    config_path: &std::path::Path,
    provider_key: &str,
) -> Result<String, ActionFailure> {
    let output = agent.run().map_err(|mut failure| {
        if failure.reason != FailureReason::NoModelsFound {
            failure.reason = FailureReason::AgentUnavailable;
        }
        failure
    })?;

    let models = parse_models(&output);
    if models.is_empty() {
        return Err(ActionFailure {
            output,
            cause: format!("no models found in {agent} output"),
            reason: FailureReason::NoModelsFound,
        });
    }

    let mut config = host_config::read(config_path)?;
    host_config::merge_models(&mut config, provider_key, &models)?;
    host_config::write(config_path, &config)?;

    let mut log = output;
    log.push_str(&format!(
        "recorded {} models under provider.{provider_key}",
        models.len()
    ));
    Ok(log)
}

/// Remove a file or symlink without following it. Returns whether it existed.
fn remove_link(link: &std::path::Path) -> io::Result<bool> {
    match fs::symlink_metadata(link) {
        Ok(_) => fs::remove_file(link).map(|_| true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

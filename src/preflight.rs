use std::path::{Path, PathBuf};

use nix::unistd::{AccessFlags, access};

use crate::detect::{AgentStatus, HostInstallInfo, PackageManager};
use crate::model::check::CheckResult;

/// Everything the check battery looks at, gathered up front.
#[derive(Debug, Clone)]
pub struct PreflightInputs {
    pub host_binary: String,
    pub host: HostInstallInfo,
    pub package_manager: Option<PackageManager>,
    pub agent_binary: String,
    pub agent: AgentStatus,
    pub config_dir: PathBuf,
    pub config_writable: bool,
    pub project_dir: PathBuf,
    pub project_dir_env: String,
    pub has_package_json: bool,
}

/// Run the fixed, ordered check battery. Reads only.
pub fn run_checks(inputs: &PreflightInputs) -> Vec<CheckResult> {
    let checks = vec![
        host_check(inputs),
        package_manager_check(inputs),
        agent_check(inputs),
        config_dir_check(inputs),
        plugin_source_check(inputs),
    ];

    for check in &checks {
        tracing::info!(
            "preflight {} {}: {}",
            check.label(),
            check.name,
            check.message
        );
    }
    checks
}

fn host_check(inputs: &PreflightInputs) -> CheckResult {
    let name = format!("{} CLI", inputs.host_binary);
    if !inputs.host.installed {
        return CheckResult::fail(name, format!("{} not found in PATH", inputs.host_binary));
    }

    let version = if inputs.host.version.is_empty() {
        "version unknown"
    } else {
        inputs.host.version.as_str()
    };
    CheckResult::pass(name, format!("{version} ({})", inputs.host.install_method))
}

fn package_manager_check(inputs: &PreflightInputs) -> CheckResult {
    match inputs.package_manager {
        Some(pm) => CheckResult::pass("Package manager", format!("{pm} found")),
        None => CheckResult::fail("Package manager", "bun or npm is required to build the plugin"),
    }
}

fn agent_check(inputs: &PreflightInputs) -> CheckResult {
    let binary = &inputs.agent_binary;
    match &inputs.agent {
        AgentStatus::Missing => CheckResult::warn(
            binary.as_str(),
            "not found (install it before using the provider)",
        ),
        AgentStatus::LoggedOut => {
            CheckResult::warn(binary.as_str(), format!("not logged in (run: {binary} login)"))
        }
        AgentStatus::LoggedIn(identity) if identity.is_empty() => {
            CheckResult::pass(binary.as_str(), "logged in")
        }
        AgentStatus::LoggedIn(identity) => CheckResult::pass(binary.as_str(), identity.as_str()),
    }
}

fn config_dir_check(inputs: &PreflightInputs) -> CheckResult {
    let dir = inputs.config_dir.display();
    if inputs.config_writable {
        CheckResult::pass("Config directory", format!("{dir} is writable"))
    } else {
        CheckResult::fail("Config directory", format!("{dir} is not writable"))
    }
}

fn plugin_source_check(inputs: &PreflightInputs) -> CheckResult {
    let dir = inputs.project_dir.display();
    if inputs.has_package_json {
        CheckResult::pass("Plugin source", dir.to_string())
    } else {
        CheckResult::fail(
            "Plugin source",
            format!("no package.json in {dir} (set {})", inputs.project_dir_env),
        )
    }
}

/// Write access on `dir`, or on its nearest existing ancestor when it does
/// not exist yet. Never creates anything.
pub fn is_writable(dir: &Path) -> bool {
    dir.ancestors()
        .find(|candidate| candidate.exists())
        .is_some_and(|existing| access(existing, AccessFlags::W_OK).is_ok())
}

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

/// JavaScript package manager used to build the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Bun,
    Npm,
}

impl PackageManager {
    /// bun is preferred when both are on PATH.
    pub fn detect() -> Option<Self> {
        Self::detect_with(|program| which::which(program).is_ok())
    }

    pub fn detect_with(exists: impl Fn(&str) -> bool) -> Option<Self> {
        [Self::Bun, Self::Npm]
            .into_iter()
            .find(|pm| exists(pm.program()))
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Bun => "bun",
            Self::Npm => "npm",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Login state of the agent CLI as reported by `whoami`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    Missing,
    LoggedOut,
    LoggedIn(String),
}

impl AgentStatus {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }
}

pub fn agent_status(binary: &str, logged_out_marker: &str) -> AgentStatus {
    let Ok(path) = which::which(binary) else {
        return AgentStatus::Missing;
    };
    probe_agent(&path, logged_out_marker)
}

pub fn probe_agent(path: &Path, logged_out_marker: &str) -> AgentStatus {
    let output = match Command::new(path)
        .arg("whoami")
        .stdin(Stdio::null())
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!("{} whoami: {err}", path.display());
            return AgentStatus::LoggedOut;
        }
    };

    if !output.status.success() {
        tracing::info!("{} whoami exited with {}", path.display(), output.status);
        return AgentStatus::LoggedOut;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.contains(logged_out_marker) {
        return AgentStatus::LoggedOut;
    }

    let identity = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string();
    AgentStatus::LoggedIn(identity)
}

use std::path::{Path, PathBuf};

use nix::unistd::{Uid, User};
use thiserror::Error;

/// Set by `sudo` to the name of the invoking account.
pub const ORIGINAL_USER_VAR: &str = "SUDO_USER";

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("cannot determine a home directory for {0}")]
    NoHome(String),
}

/// `~/.config` of the real user, even when running under sudo.
pub fn resolve_config_dir() -> Result<PathBuf, DetectionError> {
    let original = original_user();
    resolve_config_dir_with(original.as_deref(), lookup_home, current_home())
}

pub fn resolve_config_dir_with(
    original_user: Option<&str>,
    lookup: impl Fn(&str) -> Option<PathBuf>,
    current_home: Option<PathBuf>,
) -> Result<PathBuf, DetectionError> {
    if let Some(name) = original_user {
        match lookup(name) {
            Some(home) => return Ok(home.join(".config")),
            None => tracing::warn!("no home directory for original user {name}"),
        }
    }

    current_home
        .map(|home| home.join(".config"))
        .ok_or_else(|| DetectionError::NoHome(original_user.unwrap_or("current user").to_string()))
}

pub fn detect_actual_user() -> String {
    let current = User::from_uid(Uid::current())
        .ok()
        .flatten()
        .map(|user| user.name);
    actual_user_with(original_user().as_deref(), current)
}

pub fn actual_user_with(original_user: Option<&str>, current: Option<String>) -> String {
    original_user
        .map(str::to_string)
        .or(current)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Directory holding the plugin sources (`package.json`).
pub fn resolve_project_dir(override_var: &str) -> PathBuf {
    let override_dir = std::env::var_os(override_var).map(PathBuf::from);
    let cwd = std::env::current_dir().ok();
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    project_dir_with(override_dir, cwd.as_deref(), exe_dir)
}

pub fn project_dir_with(
    override_dir: Option<PathBuf>,
    cwd: Option<&Path>,
    exe_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = override_dir.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }

    if let Some(found) = cwd.and_then(|cwd| {
        cwd.ancestors()
            .find(|dir| dir.join("package.json").is_file())
            .map(Path::to_path_buf)
    }) {
        return found;
    }

    exe_dir.unwrap_or_else(|| PathBuf::from("."))
}

fn original_user() -> Option<String> {
    std::env::var(ORIGINAL_USER_VAR)
        .ok()
        .filter(|name| !name.is_empty() && name != "root")
}

fn lookup_home(name: &str) -> Option<PathBuf> {
    User::from_name(name).ok().flatten().map(|user| user.dir)
}

fn current_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

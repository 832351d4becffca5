use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::model::config::{HostConfig, PluginConfig};

/// Canonical locations under the host's config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    /// `~/.config/opencode`
    pub host_dir: PathBuf,
    pub config_path: PathBuf,
    pub plugin_dir: PathBuf,
    pub plugin_link: PathBuf,
    pub node_modules: PathBuf,
}

impl InstallPaths {
    pub fn new(config_root: &Path, host: &HostConfig, plugin: &PluginConfig) -> Self {
        let host_dir = config_root.join(&host.config_subdir);
        let plugin_dir = host_dir.join(&host.plugin_subdir);
        Self {
            config_path: host_dir.join(&host.config_file),
            plugin_link: plugin_dir.join(&plugin.file_name),
            node_modules: host_dir.join(&host.node_modules_subdir),
            plugin_dir,
            host_dir,
        }
    }
}

/// Whether the plugin is already configured, plus the config path inspected.
///
/// Never fails: unreadable or malformed config counts as "not configured".
pub fn detect_existing_setup(paths: &InstallPaths, provider_key: &str) -> (bool, PathBuf) {
    let config_path = paths.config_path.clone();

    // symlink_metadata does not follow the link, so a dangling link still counts
    if fs::symlink_metadata(&paths.plugin_link).is_ok() {
        tracing::debug!("existing plugin link at {}", paths.plugin_link.display());
        return (true, config_path);
    }

    let exists = fs::read_to_string(&config_path)
        .ok()
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        .is_some_and(|config| has_provider(&config, provider_key));
    (exists, config_path)
}

pub fn has_provider(config: &Value, provider_key: &str) -> bool {
    config
        .get("provider")
        .and_then(Value::as_object)
        .is_some_and(|providers| providers.contains_key(provider_key))
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct InstallerConfig {
    pub host: HostConfig,
    pub plugin: PluginConfig,
    pub agent: AgentConfig,
    pub ui: UiConfig,
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub binary: String,
    pub config_subdir: String,
    pub config_file: String,
    pub plugin_subdir: String,
    pub node_modules_subdir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    /// Key under `provider` in the host config.
    pub provider_key: String,
    /// File name of the symlink placed in the host plugin directory.
    pub file_name: String,
    /// Build output, relative to the project directory.
    pub entry: String,
    pub provider_name: String,
    pub npm_package: String,
    pub base_url: String,
    #[serde(default)]
    pub fallback_models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub binary: String,
    pub logged_out_marker: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub min_width: u16,
    pub min_height: u16,
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallConfig {
    pub project_dir_env: String,
    /// Run log directory. Empty means the OS temp dir.
    pub log_dir: String,
}

impl InstallerConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user_path = directories::ProjectDirs::from("", "", "cursor-acp-installer")
            .map(|d| d.config_dir().join("config.toml"));
        Self::load_layered(user_path.as_deref())
    }

    pub fn defaults() -> Result<Self> {
        Self::load_layered(None)
    }

    fn load_layered(user_path: Option<&Path>) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(DEFAULTS).context("parse default config")?;

        if let Some(path) = user_path.filter(|p| p.exists()) {
            let user_str = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            let overlay: toml::Table = toml::from_str(&user_str)
                .with_context(|| format!("parse config {}", path.display()))?;
            merge_tables(&mut table, overlay);
            tracing::info!("loaded user config from {}", path.display());
        }

        let config = toml::Value::Table(table)
            .try_into()
            .context("invalid installer config")?;
        Ok(config)
    }

    pub fn log_dir(&self) -> PathBuf {
        if self.install.log_dir.is_empty() {
            std::env::temp_dir()
        } else {
            expand_tilde(&self.install.log_dir)
        }
    }
}

/// Overlay `overlay` onto `base`, descending into tables key by key.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if !path.starts_with('~') {
        return PathBuf::from(path);
    }

    match dirs_home() {
        Some(home) => PathBuf::from(path.replacen('~', &home.to_string_lossy(), 1)),
        None => PathBuf::from(path),
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let config = InstallerConfig::defaults().unwrap();
        assert_eq!(config.host.binary, "opencode");
        assert_eq!(config.host.config_file, "opencode.json");
        assert_eq!(config.plugin.provider_key, "cursor-acp");
        assert_eq!(config.agent.binary, "cursor-agent");
        assert_eq!(config.ui.min_width, 80);
        assert_eq!(config.ui.min_height, 24);
        assert_eq!(config.plugin.fallback_models.len(), 4);
        assert_eq!(config.log_dir(), std::env::temp_dir());
    }

    #[test]
    fn user_file_overrides_single_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[agent]\nbinary = \"my-agent\"\n\n[install]\nlog_dir = \"/var/tmp/installer\"\n",
        )
        .unwrap();

        let config = InstallerConfig::load_layered(Some(&path)).unwrap();
        assert_eq!(config.agent.binary, "my-agent");
        // untouched sibling key keeps its default
        assert_eq!(config.agent.logged_out_marker, "Not logged in");
        assert_eq!(config.host.binary, "opencode");
        assert_eq!(config.log_dir(), PathBuf::from("/var/tmp/installer"));
    }

    #[test]
    fn invalid_user_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ui]\nmin_width = \"wide\"\n").unwrap();

        assert!(InstallerConfig::load_layered(Some(&path)).is_err());
    }

    #[test]
    fn missing_user_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = InstallerConfig::load_layered(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.plugin.file_name, "cursor-acp.js");
    }
}

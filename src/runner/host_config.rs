use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::model::config::{ModelEntry, PluginConfig};

#[derive(Debug, Error)]
pub enum HostConfigError {
    #[error("{path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("{path}: invalid JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("{path}: top level is not a JSON object")]
    NotAnObject { path: String },
    #[error("provider {0} not found in config")]
    MissingProvider(String),
}

/// Read the host config; a missing file reads as an empty object.
pub fn read(path: &Path) -> Result<Map<String, Value>, HostConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(source) => {
            return Err(HostConfigError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    match serde_json::from_str(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(HostConfigError::NotAnObject {
            path: path.display().to_string(),
        }),
        Err(source) => Err(HostConfigError::Parse {
            path: path.display().to_string(),
            source,
        }),
    }
}

pub fn write(path: &Path, config: &Map<String, Value>) -> Result<(), HostConfigError> {
    let io_err = |source| HostConfigError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut text = serde_json::to_string_pretty(config).map_err(|source| HostConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    text.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

/// Parse the file strictly; used for the final validation step.
pub fn validate(path: &Path) -> Result<(), HostConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| HostConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str::<Value>(&raw)
        .map(|_| ())
        .map_err(|source| HostConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
}

pub fn provider_entry(plugin: &PluginConfig) -> Value {
    json!({
        "name": plugin.provider_name,
        "npm": plugin.npm_package,
        "options": { "baseURL": plugin.base_url },
        "models": models_value(&plugin.fallback_models),
    })
}

pub fn models_value(models: &[ModelEntry]) -> Value {
    let map: Map<String, Value> = models
        .iter()
        .map(|model| (model.id.clone(), json!({ "name": model.name })))
        .collect();
    Value::Object(map)
}

/// Merge `entry` into `provider.<key>`, keeping unrelated keys intact.
pub fn merge_provider(config: &mut Map<String, Value>, key: &str, entry: Value) {
    let providers = config
        .entry("provider")
        .or_insert_with(|| Value::Object(Map::new()));
    if !providers.is_object() {
        *providers = Value::Object(Map::new());
    }
    if let Value::Object(providers) = providers {
        let slot = providers.entry(key).or_insert(Value::Null);
        merge_value(slot, entry);
    }
}

/// Returns whether the key was present.
pub fn remove_provider(config: &mut Map<String, Value>, key: &str) -> bool {
    config
        .get_mut("provider")
        .and_then(Value::as_object_mut)
        .is_some_and(|providers| providers.remove(key).is_some())
}

pub fn merge_models(
    config: &mut Map<String, Value>,
    key: &str,
    models: &[ModelEntry],
) -> Result<(), HostConfigError> {
    let provider = config
        .get_mut("provider")
        .and_then(Value::as_object_mut)
        .and_then(|providers| providers.get_mut(key))
        .filter(|provider| provider.is_object())
        .ok_or_else(|| HostConfigError::MissingProvider(key.to_string()))?;

    merge_value(provider, json!({ "models": models_value(models) }));
    Ok(())
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_value(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::InstallerConfig;

    fn plugin() -> PluginConfig {
        InstallerConfig::defaults().unwrap().plugin
    }

    #[test]
    fn merge_keeps_unrelated_keys_and_existing_models() {
        let mut config: Map<String, Value> = serde_json::from_value(json!({
            "theme": "dark",
            "provider": {
                "anthropic": { "name": "Anthropic" },
                "cursor-acp": { "models": { "custom": { "name": "Custom" } } }
            }
        }))
        .unwrap();

        merge_provider(&mut config, "cursor-acp", provider_entry(&plugin()));

        assert_eq!(config["theme"], "dark");
        assert_eq!(config["provider"]["anthropic"]["name"], "Anthropic");
        let entry = &config["provider"]["cursor-acp"];
        assert_eq!(entry["name"], "Cursor");
        assert_eq!(entry["npm"], "@ai-sdk/openai-compatible");
        assert_eq!(entry["options"]["baseURL"], "http://127.0.0.1:32124/v1");
        assert_eq!(entry["models"]["custom"]["name"], "Custom");
        assert_eq!(entry["models"]["auto"]["name"], "Auto");
    }

    #[test]
    fn merge_replaces_non_object_provider_map() {
        let mut config: Map<String, Value> =
            serde_json::from_value(json!({ "provider": "oops" })).unwrap();
        merge_provider(&mut config, "cursor-acp", json!({ "name": "Cursor" }));
        assert_eq!(config["provider"]["cursor-acp"]["name"], "Cursor");
    }

    #[test]
    fn remove_reports_presence() {
        let mut config: Map<String, Value> = serde_json::from_value(json!({
            "provider": { "cursor-acp": {}, "other": {} }
        }))
        .unwrap();
        assert!(remove_provider(&mut config, "cursor-acp"));
        assert!(!remove_provider(&mut config, "cursor-acp"));
        assert!(config["provider"]["other"].is_object());

        let mut empty = Map::new();
        assert!(!remove_provider(&mut empty, "cursor-acp"));
    }

    #[test]
    fn models_need_existing_provider() {
        let models = vec![ModelEntry {
            id: "gpt-5".into(),
            name: "GPT-5".into(),
        }];
        let mut config = Map::new();
        assert!(matches!(
            merge_models(&mut config, "cursor-acp", &models),
            Err(HostConfigError::MissingProvider(_))
        ));

        merge_provider(
            &mut config,
            "cursor-acp",
            json!({ "models": { "auto": { "name": "Auto" } } }),
        );
        merge_models(&mut config, "cursor-acp", &models).unwrap();
        assert_eq!(config["provider"]["cursor-acp"]["models"]["gpt-5"]["name"], "GPT-5");
        assert_eq!(config["provider"]["cursor-acp"]["models"]["auto"]["name"], "Auto");
    }

    #[test]
    fn read_write_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opencode").join("opencode.json");

        assert!(read(&path).unwrap().is_empty());

        let mut config = Map::new();
        merge_provider(&mut config, "cursor-acp", json!({ "name": "Cursor" }));
        write(&path, &config).unwrap();
        validate(&path).unwrap();
        assert_eq!(read(&path).unwrap(), config);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_or_non_object_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opencode.json");

        fs::write(&path, "{ broken").unwrap();
        assert!(matches!(read(&path), Err(HostConfigError::Parse { .. })));
        assert!(validate(&path).is_err());

        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(read(&path), Err(HostConfigError::NotAnObject { .. })));
        assert!(validate(&path).is_ok());
    }
}

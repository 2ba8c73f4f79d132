use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ConfigError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

/// Environment variables folded into the document after the YAML layers,
/// as `(variable, section, key)`.
const ENV_OVERRIDES: [(&str, &str, &str); 7] = [
    ("PINECONE_API_KEY", "index", "api_key"),
    ("GOOGLE_API_KEY", "generation", "api_key"),
    ("EMBEDDING_API_KEY", "embedding", "api_key"),
    ("EMBEDDING_BASE_URL", "embedding", "base_url"),
    ("INDEX_NAME", "index", "name"),
    ("HOST", "server", "host"),
    ("PORT", "server", "port"),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("CARDIO_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged `config.yml` + `secrets.yaml` + process environment.
    pub fn load_config(&self) -> Result<Value, ConfigError> {
        self.load_config_with(|key| env::var(key).ok())
    }

    pub fn load_config_with<F>(&self, lookup: F) -> Result<Value, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, lookup);
        validate_config(&merged)?;
        Ok(merged)
    }

    /// Loads, validates and deserializes the merged configuration. The
    /// redacted document is logged at debug level.
    pub fn load_typed(&self) -> Result<AppConfig, ConfigError> {
        let merged = self.load_config()?;
        tracing::debug!(
            path = %self.config_path().display(),
            config = %self.redact_sensitive_values(&merged),
            "Loaded configuration"
        );
        parse_config(merged)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

pub fn parse_config(value: Value) -> Result<AppConfig, ConfigError> {
    serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn load_yaml_file(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    match serde_yaml::from_str::<Value>(&contents) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(_) => Err(ConfigError::Invalid {
            path: path.display().to_string(),
            reason: "expected a mapping at the document root".to_string(),
        }),
        Err(e) => Err(ConfigError::Parse(format!("{}: {}", path.display(), e))),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (var, section, key) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = if var == "PORT" {
            match raw.parse::<u64>() {
                Ok(port) => Value::from(port),
                Err(_) => {
                    tracing::warn!("Ignoring non-numeric PORT value '{}'", raw);
                    continue;
                }
            }
        } else {
            Value::String(raw.to_string())
        };
        ensure_object_path(config, &[section, key], value);
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_in(dir: &Path) -> ConfigService {
        ConfigService::new(Arc::new(AppPaths::with_dirs(
            dir.to_path_buf(),
            dir.to_path_buf(),
        )))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "index": { "api_key": "pc-secret", "name": "medical" },
            "generation": { "api_key": null, "model": "gemini-2.0-flash" }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "index": { "api_key": "****", "name": "medical" },
                "generation": { "api_key": null, "model": "gemini-2.0-flash" }
            })
        );
    }

    #[test]
    fn env_overrides_create_missing_sections() {
        let mut config = json!({ "index": { "name": "from-yaml" } });
        apply_env_overrides(&mut config, |key| match key {
            "PINECONE_API_KEY" => Some("pc".to_string()),
            "GOOGLE_API_KEY" => Some("  ".to_string()),
            "PORT" => Some("9000".to_string()),
            _ => None,
        });

        assert_eq!(
            config,
            json!({
                "index": { "name": "from-yaml", "api_key": "pc" },
                "server": { "port": 9000 }
            })
        );
    }

    #[test]
    fn load_config_merges_secrets_and_environment() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "retrieval:\n  top_k: 5\nindex:\n  name: cardiology\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("secrets.yaml"),
            "index:\n  api_key: from-secrets\n",
        )
        .unwrap();

        let service = service_in(dir.path());
        let merged = service
            .load_config_with(|key| (key == "GOOGLE_API_KEY").then(|| "g".to_string()))
            .unwrap();
        let config = parse_config(merged).unwrap();

        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.index.name, "cardiology");
        assert_eq!(config.index.api_key.as_deref(), Some("from-secrets"));
        assert_eq!(config.generation.api_key.as_deref(), Some("g"));
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yml"), "retrieval:\n  top_k: 0\n").unwrap();

        let err = service_in(dir.path())
            .load_config_with(|_| None)
            .unwrap_err();
        assert!(err.to_string().contains("retrieval.top_k"));
    }
}

use casebundle_editor::SyncOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "casebundle.config.json";

/// Casebundle configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// JSON file holding the bundle tree
    #[serde(default = "default_bundle_file")]
    pub bundle_file: String,

    #[serde(default = "default_bundle_id")]
    pub bundle_id: String,

    /// Failure policy and event buffering for the sync coordinator
    #[serde(flatten)]
    pub sync: SyncOptions,

    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bundle_file() -> String {
    "bundle.json".to_string()
}

fn default_bundle_id() -> String {
    "bundle".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Absolute path to the bundle file
    pub fn bundle_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.bundle_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bundle_file: default_bundle_file(),
            bundle_id: default_bundle_id(),
            sync: SyncOptions::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebundle_editor::FailurePolicy;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "bundleFile": "cases/smith.json",
            "bundleId": "smith-v-jones",
            "failurePolicy": "restoreSnapshot",
            "logLevel": "debug"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.bundle_file, "cases/smith.json");
        assert_eq!(config.bundle_id, "smith-v-jones");
        assert_eq!(config.sync.failure_policy, FailurePolicy::RestoreSnapshot);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bundle_file, "bundle.json");
        assert_eq!(config.sync, SyncOptions::default());
    }

    #[test]
    fn test_load_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.bundle_id, "bundle");
        assert_eq!(config.bundle_path("/work"), PathBuf::from("/work/bundle.json"));
    }
}

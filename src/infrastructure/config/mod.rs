//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;
use crate::infrastructure::storage::is_valid_scope_id;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Scopes opened in console mode
    #[serde(default)]
    pub scopes: Vec<ScopeConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReconcilerConfig {
    pub enabled: bool,
    pub period_ms: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    pub channel: Option<String>,
}

/// A community, with the courses and members it starts with in console mode
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScopeConfig {
    pub id: String,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "warden-bot".to_string(),
            prefix: "!".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: crate::application::services::DEFAULT_PERIOD_MS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            storage: StorageConfig::default(),
            reconciler: ReconcilerConfig::default(),
            notifications: NotificationConfig::default(),
            scopes: vec![ScopeConfig {
                id: "console".to_string(),
                courses: vec!["math".to_string(), "physics".to_string()],
                members: vec!["1001".to_string(), "1002".to_string()],
            }],
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.reconciler.period_ms <= 0 {
            return Err(ConfigError::InvalidValue(format!(
                "reconciler.period-ms must be positive, got {}",
                self.reconciler.period_ms
            )));
        }
        for scope in &self.scopes {
            if !is_valid_scope_id(&scope.id) {
                return Err(ConfigError::InvalidValue(format!("invalid scope id {:?}", scope.id)));
            }
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(dir) = std::env::var("WARDEN_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("WARDEN_WEBHOOK_URL") {
            config.notifications.webhook_url = Some(url);
        }

        if let Ok(prefix) = std::env::var("WARDEN_PREFIX") {
            config.bot.prefix = prefix;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml(
            "storage:\n  data-dir: /var/lib/warden\nscopes:\n  - id: '42'\n    courses: [chem]\n",
        )
        .unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/warden"));
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.reconciler.period_ms, 60_000);
        assert!(config.reconciler.enabled);
        assert_eq!(config.scopes[0].courses, vec!["chem"]);
        assert!(config.scopes[0].members.is_empty());
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("period-ms"));
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.scopes.len(), 1);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            Config::from_yaml("reconciler:\n  enabled: true\n  period-ms: 0\n"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            Config::from_yaml("scopes:\n  - id: ../etc\n"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(Config::from_yaml("bot: ["), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::from_yaml("bot:\n  prefix: ''\n"),
            Err(ConfigError::MissingField(_))
        ));
    }
}

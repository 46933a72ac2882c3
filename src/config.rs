// This file is part of the product Quill.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    2
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Public base URL used to build post links in notifications.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_app_name() -> String {
    "Quill".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub audience: String,
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: u64,
}

fn default_jwt_issuer() -> String {
    "quill".to_string()
}

fn default_jwt_audience() -> String {
    "quill-api".to_string()
}

fn default_expiration_hours() -> u64 {
    12
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationConfig {
    /// Delivery attempts per task before it moves to the failed state.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_channel_depth")]
    pub channel_depth: usize,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_channel_depth() -> usize {
    64
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            channel_depth: default_channel_depth(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::LoadError(format!("Failed to parse config: {}", e)))
    }

    pub fn load_and_validate(root: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(root)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt.secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt.secret must not be empty".to_string(),
            ));
        }
        if self.auth.jwt.secret.len() < 16 {
            return Err(ConfigError::ValidationError(
                "auth.jwt.secret must be at least 16 characters".to_string(),
            ));
        }
        if self.auth.jwt.expiration_hours == 0 {
            return Err(ConfigError::ValidationError(
                "auth.jwt.expiration_hours must be greater than zero".to_string(),
            ));
        }
        if self.notifications.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "notifications.max_attempts must be greater than zero".to_string(),
            ));
        }
        if self.notifications.channel_depth == 0 {
            return Err(ConfigError::ValidationError(
                "notifications.channel_depth must be greater than zero".to_string(),
            ));
        }
        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be greater than zero".to_string(),
            ));
        }
        if self.app.base_url.trim_end_matches('/').is_empty() {
            return Err(ConfigError::ValidationError(
                "app.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig::default(),
        app: AppConfig {
            name: "Quill Test".to_string(),
            base_url: "http://blog.test".to_string(),
        },
        auth: AuthConfig {
            jwt: JwtConfig {
                secret: "test-secret-key-0123456789".to_string(),
                issuer: default_jwt_issuer(),
                audience: default_jwt_audience(),
                expiration_hours: 12,
            },
        },
        notifications: NotificationConfig::default(),
        logging: LoggingConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_applies_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let yaml = "auth:\n  jwt:\n    secret: \"0123456789abcdef\"\n";
        fs::write(temp.path().join(CONFIG_FILE_NAME), yaml).expect("write config");

        let config = Config::load_and_validate(temp.path()).expect("load config");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt.expiration_hours, 12);
        assert_eq!(config.notifications.max_attempts, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn load_fails_without_config_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = Config::load(temp.path()).expect_err("missing file");
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn validate_rejects_short_secret() {
        let mut config = test_config();
        config.auth.jwt.secret = "short".to_string();
        let err = config.validate().expect_err("short secret");
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = test_config();
        config.notifications.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_expiration() {
        let mut config = test_config();
        config.auth.jwt.expiration_hours = 0;
        assert!(config.validate().is_err());
    }
}

//! Configuration management.
//!
//! Wayfarer reads a TOML file with three sections: `[game]` for engine
//! cadence and flavor, `[storage]` for the data directory, and `[logging]`
//! for the log level. All values are validated on load and `init` writes a
//! commented starter file. CLI verbosity flags override the configured log
//! level at startup.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Display name of the world, used in startup logging.
    pub world_name: String,
    /// Minutes between updates for any single adventure container.
    pub update_interval_minutes: u32,
    /// Seconds between scheduler passes over the due set.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u32,
    /// Noun used for currency in notifications.
    #[serde(default = "default_currency_name")]
    pub currency_name: String,
    /// Seed the starter zones into an empty store on startup.
    #[serde(default)]
    pub seed_demo_world: bool,
}

fn default_tick_seconds() -> u32 {
    30
}

fn default_currency_name() -> String {
    "coins".to_string()
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled store and the watermark file.
    pub data_dir: String,
}

impl StorageConfig {
    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("world")
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of error, warn, info, debug, trace.
    pub level: String,
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: GameConfig {
                world_name: "Wayfarer".to_string(),
                update_interval_minutes: 60,
                tick_seconds: default_tick_seconds(),
                currency_name: default_currency_name(),
                seed_demo_world: true,
            },
            storage: StorageConfig {
                data_dir: "data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub async fn load(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file: {path}"))?;
        let config: Config =
            toml::from_str(&raw).with_context(|| format!("failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration back out.
    pub async fn save(&self, path: &str) -> Result<()> {
        let raw = toml::to_string_pretty(self).context("failed to serialize configuration")?;
        fs::write(path, raw)
            .await
            .with_context(|| format!("failed to write config file: {path}"))?;
        Ok(())
    }

    /// Write a starter configuration file. Refuses to clobber an existing one.
    pub async fn create_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            return Err(anyhow!("config file already exists: {path}"));
        }
        let config = Config::default();
        config.save(path).await?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.world_name.trim().is_empty() {
            return Err(anyhow!("game.world_name must not be empty"));
        }
        if self.game.update_interval_minutes == 0 {
            return Err(anyhow!("game.update_interval_minutes must be at least 1"));
        }
        if self.game.tick_seconds == 0 {
            return Err(anyhow!("game.tick_seconds must be at least 1"));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(anyhow!("logging.level '{other}' is not a valid log level")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_round_trips() {
        let config = Config::default();
        config.validate().expect("default config valid");
        let raw = toml::to_string_pretty(&config).expect("serialize");
        let parsed: Config = toml::from_str(&raw).expect("parse");
        assert_eq!(parsed.game.update_interval_minutes, 60);
        assert_eq!(parsed.game.currency_name, "coins");
        assert!(parsed.game.seed_demo_world);
    }

    #[test]
    fn optional_fields_have_defaults() {
        let raw = r#"
            [game]
            world_name = "Testland"
            update_interval_minutes = 15

            [storage]
            data_dir = "/tmp/wayfarer"

            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(raw).expect("parse");
        config.validate().expect("valid");
        assert_eq!(config.game.tick_seconds, 30);
        assert_eq!(config.game.currency_name, "coins");
        assert!(!config.game.seed_demo_world);
    }

    #[test]
    fn bad_values_fail_validation() {
        let mut config = Config::default();
        config.game.update_interval_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.data_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }
}

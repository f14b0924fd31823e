//! # Configuration
//!
//! TOML configuration for the inventory engine, its storage backend and logging.
//! Every section and field is optional; missing values fall back to defaults.
//!
//! ```toml
//! [inventory]
//! max_slots = 50
//! task_prefix = "inventory"
//! auto_save = true
//! storage_key = "portals_inventory"
//! debug = false
//!
//! [storage]
//! backend = "file"   # file | sled | memory
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "inventory.log"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::inventory::DEFAULT_MAX_SLOTS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine construction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Maximum number of distinct item stacks.
    pub max_slots: usize,
    /// Leading segment of every outbound task name.
    pub task_prefix: String,
    /// Hydrate on start and flush after every mutation.
    pub auto_save: bool,
    /// Key the persisted blob is stored under.
    pub storage_key: String,
    /// Verbose tracing only; no behavioral effect.
    pub debug: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
            task_prefix: "inventory".to_string(),
            auto_save: true,
            storage_key: "portals_inventory".to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    File,
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::File,
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let inv = &self.inventory;
        if inv.max_slots == 0 {
            return Err(anyhow!("inventory.max_slots must be at least 1"));
        }
        if inv.task_prefix.trim().is_empty() {
            return Err(anyhow!("inventory.task_prefix must not be empty"));
        }
        if inv.storage_key.trim().is_empty() {
            return Err(anyhow!("inventory.storage_key must not be empty"));
        }
        if inv.storage_key.contains(['/', '\\']) || inv.storage_key.starts_with('.') {
            return Err(anyhow!(
                "inventory.storage_key '{}' must be a plain name",
                inv.storage_key
            ));
        }
        Ok(())
    }

    /// Base log level, raised to debug when `inventory.debug` is set.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.inventory.debug {
            return log::LevelFilter::Debug;
        }
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

// ==========================================
// Inbound Flow Engine - Config Manager
// ==========================================
// Role: load engine settings from config_kv (global scope) with defaults
// Storage: config_kv table (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    pub const LABEL_PREFIX: &str = "flow.label_prefix";
    pub const SNAPSHOT_CACHE_ENABLED: &str = "flow.snapshot_cache_enabled";
    pub const SNAPSHOT_CACHE_CAPACITY: &str = "flow.snapshot_cache_capacity";
}

pub const DEFAULT_LABEL_PREFIX: &str = "LBL-";
pub const DEFAULT_SNAPSHOT_CACHE_CAPACITY: usize = 256;

// ==========================================
// FlowConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Label UID prefix, matched case-insensitively
    pub label_prefix: String,
    pub snapshot_cache_enabled: bool,
    pub snapshot_cache_capacity: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            snapshot_cache_enabled: false,
            snapshot_cache_capacity: DEFAULT_SNAPSHOT_CACHE_CAPACITY,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.label_prefix.trim().is_empty() {
            return Err(format!("{} must not be blank", config_keys::LABEL_PREFIX));
        }
        Ok(())
    }
}

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Open the config store at `db_path`
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Read a global-scope value
    ///
    /// # Returns
    /// - Some(String): value present
    /// - None: key missing, or no config_kv table in this database
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let has_table = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='config_kv' LIMIT 1",
                [],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !has_table {
            return Ok(None);
        }

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_parsed_or_default<T: std::str::FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "unparsable config value, using default");
                Ok(default)
            }
        }
    }

    /// Load the engine settings, falling back to defaults key by key
    pub fn load_flow_config(&self) -> RepositoryResult<FlowConfig> {
        let defaults = FlowConfig::default();

        let label_prefix = self
            .get_global_config_value(config_keys::LABEL_PREFIX)?
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.label_prefix);

        let snapshot_cache_enabled = match self.get_global_config_value(config_keys::SNAPSHOT_CACHE_ENABLED)? {
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    config_key = config_keys::SNAPSHOT_CACHE_ENABLED,
                    raw_value = %raw,
                    "unparsable config value, using default"
                );
                defaults.snapshot_cache_enabled
            }),
            None => defaults.snapshot_cache_enabled,
        };

        let snapshot_cache_capacity = self.get_parsed_or_default(
            config_keys::SNAPSHOT_CACHE_CAPACITY,
            defaults.snapshot_cache_capacity,
        )?;

        Ok(FlowConfig {
            label_prefix,
            snapshot_cache_enabled,
            snapshot_cache_capacity,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

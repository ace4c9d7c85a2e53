//! Configuration from process environment and `.env` files

use super::{ConfigError, MetricType, MilvusConfig, MilvusConfigOptions};
use std::path::PathBuf;

pub const ENV_CLUSTER_ENDPOINT: &str = "MILVUS_CLUSTER_ENDPOINT";
pub const ENV_TOKEN: &str = "MILVUS_TOKEN";
pub const ENV_COLLECTION_NAME: &str = "MILVUS_COLLECTION_NAME";
pub const ENV_DIMENSION: &str = "MILVUS_DIMENSION";
pub const ENV_METRIC_TYPE: &str = "MILVUS_METRIC_TYPE";
pub const ENV_ENABLE_DYNAMIC_FIELD: &str = "MILVUS_ENABLE_DYNAMIC_FIELD";
pub const ENV_AUTO_ID: &str = "MILVUS_AUTO_ID";
pub const ENV_INDEX_TYPE: &str = "MILVUS_INDEX_TYPE";

/// Load .env files from multiple locations with priority order:
/// 1. Current working directory (project-specific config)
/// 2. XDG config directory ~/.config/milvus-store/.env (global default config)
///
/// Variables already set in the process always win; dotenv never overrides them.
pub fn load_env_files() {
    let cwd_env = std::env::current_dir().map(|p| p.join(".env")).ok();
    if let Some(path) = cwd_env {
        if path.exists() && dotenv::from_path(&path).is_ok() {
            tracing::debug!("Loaded .env from: {}", path.display());
            return;
        }
    }

    if let Some(config_dir) = get_xdg_config_dir() {
        let xdg_env = config_dir.join("milvus-store").join(".env");
        if xdg_env.exists() && dotenv::from_path(&xdg_env).is_ok() {
            tracing::debug!("Loaded .env from: {}", xdg_env.display());
            return;
        }
    }

    tracing::debug!("No .env file found, using environment variables only");
}

/// Get XDG config directory, fallback to ~/.config
fn get_xdg_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

impl MilvusConfig {
    /// Build from `MILVUS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup using the `MILVUS_*` variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dimension = lookup(ENV_DIMENSION)
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| invalid(ENV_DIMENSION, &raw))
            })
            .transpose()?;

        let metric_type = lookup(ENV_METRIC_TYPE)
            .map(|raw| {
                raw.parse::<MetricType>()
                    .map_err(|_| invalid(ENV_METRIC_TYPE, &raw))
            })
            .transpose()?;

        let enable_dynamic_field = lookup(ENV_ENABLE_DYNAMIC_FIELD)
            .map(|raw| parse_bool(ENV_ENABLE_DYNAMIC_FIELD, &raw))
            .transpose()?;
        let auto_id = lookup(ENV_AUTO_ID)
            .map(|raw| parse_bool(ENV_AUTO_ID, &raw))
            .transpose()?;

        Self::new(MilvusConfigOptions {
            cluster_endpoint: lookup(ENV_CLUSTER_ENDPOINT),
            token: lookup(ENV_TOKEN),
            collection_name: lookup(ENV_COLLECTION_NAME),
            dimension,
            metric_type,
            enable_dynamic_field,
            auto_id,
            index_type: lookup(ENV_INDEX_TYPE),
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

fn invalid(key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    }
}

//! Configuration loader for longmem.
//!
//! Reads `config.toml` from the data directory (`~/.longmem/` by default) and
//! deserializes it into [`LongMemConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use longmem_types::config::LongMemConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LONGMEM_DATA_DIR";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or unparseable file: warning logged, defaults.
pub async fn load_config(data_dir: &Path) -> LongMemConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return LongMemConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return LongMemConfig::default();
        }
    };

    match toml::from_str::<LongMemConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            LongMemConfig::default()
        }
    }
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `LONGMEM_DATA_DIR` environment variable
/// 2. `~/.longmem`
/// 3. `.longmem` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".longmem");
    }

    PathBuf::from(".longmem")
}

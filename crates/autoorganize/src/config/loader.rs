use std::path::{Path, PathBuf};

use crate::config::schema::{AutoOrganizeConfig, OrganizeOptionsCommon};
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AutoOrganizeConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AutoOrganizeConfig, ConfigError> {
    let config: AutoOrganizeConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Structural validation only. Naming patterns are checked when an organize
/// attempt actually expands them, so a bad pattern fails that attempt rather
/// than the whole load.
pub fn validate_config(config: &AutoOrganizeConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.scan_interval_minutes == 0 {
        return Err(ConfigError::Validation {
            message: "scanIntervalMinutes must be greater than zero".to_string(),
        });
    }

    validate_common("episode", &config.episode.common)?;
    validate_common("movie", &config.movie.common)?;

    Ok(())
}

fn validate_common(kind: &str, options: &OrganizeOptionsCommon) -> Result<(), ConfigError> {
    for location in &options.watch_locations {
        if location.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("{} options contain an empty watch location", kind),
            });
        }
    }

    for ext in &options.left_over_file_extensions_to_delete {
        if ext.trim_start_matches('.').trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("{} options contain an empty leftover extension", kind),
            });
        }
    }

    Ok(())
}

/// Returns the canonical database path: `<data dir>/autoorganize/autoorganize.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("autoorganize").join("autoorganize.db"))
}

/// Resolves the configured database path or the platform default.
pub fn database_path(config: &AutoOrganizeConfig) -> Option<PathBuf> {
    config
        .database_path
        .as_ref()
        .map(PathBuf::from)
        .or_else(default_database_path)
}

// Configuration loading and parsing (config/wikibingo.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// wikibingo.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire wikibingo.toml file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wiki: WikiConfig,
    pub database: DatabaseConfig,
    pub board: BoardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WikiConfig {
    pub api_url: String,
    pub request_timeout_secs: u64,
    /// Member cap when expanding a category for a board pool.
    pub category_page_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Squares drawn per board. 25 is a standard 5x5 card.
    pub sample_size: usize,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/wikibingo.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization
/// automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_path = base_dir.join("config").join("wikibingo.toml");
    let text = read_file(&config_path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure `config/wikibingo.toml` exists by copying it from `defaults/` if
/// missing. Returns `true` if a copy was made. An existing file is never
/// overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<bool, ConfigError> {
    let default_path = base_dir.join("defaults").join("wikibingo.toml");
    let config_dir = base_dir.join("config");
    let target = config_dir.join("wikibingo.toml");

    if target.exists() {
        return Ok(false);
    }
    if !default_path.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither {} nor defaults/wikibingo.toml found in {}; \
                 run from the project root or ensure defaults/ is present",
                target.display(),
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;
    std::fs::copy(&default_path, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", default_path.display()),
    })?;

    Ok(true)
}

/// Convenience wrapper: loads config relative to the current working
/// directory. Ensures the default config file is copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.wiki.api_url.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "wiki.api_url".into(),
            message: "must not be empty".into(),
        });
    }

    if config.wiki.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "wiki.request_timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.wiki.category_page_limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "wiki.category_page_limit".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.board.sample_size == 0 {
        return Err(ConfigError::ValidationError {
            field: "board.sample_size".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.board.sample_size > config.wiki.category_page_limit {
        return Err(ConfigError::ValidationError {
            field: "board.sample_size".into(),
            message: format!(
                "must not exceed wiki.category_page_limit ({}), got {}",
                config.wiki.category_page_limit, config.board.sample_size
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

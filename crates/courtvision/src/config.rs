// Configuration loading and parsing (courtvision.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the single config file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "courtvision.toml";

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
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub league: LeagueConfig,
    pub cache: CacheConfig,
    pub similarity: SimilarityConfig,
    pub data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// Season whose league distributions grade every player, e.g. "2024-25".
    pub reference_season: String,
    /// Players below this many games are left out of league distributions.
    #[serde(default = "default_min_games_played")]
    pub min_games_played: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub db_path: String,
    pub distribution_ttl_hours: i64,
    pub historical_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityConfig {
    pub top_k: usize,
    pub min_minutes_per_game: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub league_basic: String,
    pub league_advanced: String,
    pub league_per100: String,
    pub career_seasons: String,
    pub career_totals: String,
    /// Optional: players without playoff history are not an error.
    #[serde(default)]
    pub playoff_totals: Option<String>,
    pub awards: String,
}

fn default_min_games_played() -> u32 {
    10
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/courtvision.toml` relative to
/// `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/courtvision.toml` into `config/` unless a config file is
/// already there. Returns whether a copy was made.
pub fn ensure_config_file(base_dir: &Path) -> Result<bool, ConfigError> {
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);
    if target.exists() {
        return Ok(false);
    }

    let default = base_dir.join("defaults").join(CONFIG_FILE);
    if !default.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {CONFIG_FILE} in config/ or defaults/ under {}; run from the crate root",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;
    std::fs::copy(&default, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", default.display(), target.display()),
    })?;
    Ok(true)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Copies the default config file first if needed.
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
    if config.league.reference_season.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.reference_season".into(),
            message: "must not be empty".into(),
        });
    }

    let ttl_fields: &[(&str, i64)] = &[
        ("cache.distribution_ttl_hours", config.cache.distribution_ttl_hours),
        ("cache.historical_ttl_days", config.cache.historical_ttl_days),
    ];
    for (name, val) in ttl_fields {
        if *val <= 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be > 0, got {val}"),
            });
        }
    }

    if config.similarity.top_k == 0 {
        return Err(ConfigError::ValidationError {
            field: "similarity.top_k".into(),
            message: "must be > 0".into(),
        });
    }

    let min_minutes = config.similarity.min_minutes_per_game;
    if !min_minutes.is_finite() || min_minutes < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "similarity.min_minutes_per_game".into(),
            message: format!("must be a non-negative number, got {min_minutes}"),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

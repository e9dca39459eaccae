use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "FORMFILL_CACHE";

/// Prefix of the environment variables read by [`EngineConfig::from_env`].
pub const ENV_PREFIX: &str = "FORMFILL_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid config file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Tunable thresholds of the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Closed-choice fields classified below this confidence only accept
    /// options found by an exact tier or a domain transform
    pub option_trust_threshold: f32,
    /// Shortest word counted by word-overlap matching
    pub min_token_len: usize,
    /// Shortest word that makes a word-overlap match significant, and the
    /// lowest overlap score accepted
    pub significant_token_len: usize,
    /// Length of a degree program in years
    pub program_length_years: u32,
    /// Year used for graduation-year conversion; the system clock when unset
    pub current_year: Option<i32>,
    /// Cache entries older than this are discarded
    pub cache_retention_days: i64,
    /// Run cache cleanup once every this many stores
    pub cleanup_every: usize,
    /// Predictions below this confidence are treated as no prediction
    pub min_classifier_confidence: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            option_trust_threshold: 0.8,
            min_token_len: 3,
            significant_token_len: 4,
            program_length_years: 4,
            current_year: None,
            cache_retention_days: 30,
            cleanup_every: 25,
            min_classifier_confidence: 0.0,
        }
    }
}

impl EngineConfig {
    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("Loading engine config from {:?}", path);
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with any `FORMFILL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Applies overrides looked up by upper-case key (`OPTION_TRUST_THRESHOLD`, ...).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPTION_TRUST_THRESHOLD") {
            self.option_trust_threshold = parse_value("OPTION_TRUST_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("MIN_TOKEN_LEN") {
            self.min_token_len = parse_value("MIN_TOKEN_LEN", &v)?;
        }
        if let Some(v) = lookup("SIGNIFICANT_TOKEN_LEN") {
            self.significant_token_len = parse_value("SIGNIFICANT_TOKEN_LEN", &v)?;
        }
        if let Some(v) = lookup("PROGRAM_LENGTH_YEARS") {
            self.program_length_years = parse_value("PROGRAM_LENGTH_YEARS", &v)?;
        }
        if let Some(v) = lookup("CURRENT_YEAR") {
            self.current_year = Some(parse_value("CURRENT_YEAR", &v)?);
        }
        if let Some(v) = lookup("CACHE_RETENTION_DAYS") {
            self.cache_retention_days = parse_value("CACHE_RETENTION_DAYS", &v)?;
        }
        if let Some(v) = lookup("CLEANUP_EVERY") {
            self.cleanup_every = parse_value("CLEANUP_EVERY", &v)?;
        }
        if let Some(v) = lookup("MIN_CLASSIFIER_CONFIDENCE") {
            self.min_classifier_confidence = parse_value("MIN_CLASSIFIER_CONFIDENCE", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("option_trust_threshold", self.option_trust_threshold)?;
        check_unit("min_classifier_confidence", self.min_classifier_confidence)?;
        if self.min_token_len == 0 {
            return Err(invalid("min_token_len", "must be at least 1"));
        }
        if self.significant_token_len < self.min_token_len {
            return Err(invalid("significant_token_len", "must not be below min_token_len"));
        }
        if !(1..=9).contains(&self.program_length_years) {
            return Err(invalid("program_length_years", "must be between 1 and 9"));
        }
        if self.cache_retention_days <= 0 {
            return Err(invalid("cache_retention_days", "must be positive"));
        }
        if self.cleanup_every == 0 {
            return Err(invalid("cleanup_every", "must be at least 1"));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(key, &format!("cannot parse '{}'", raw)))
}

fn check_unit(key: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(key, &format!("{} is outside [0, 1]", value)))
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Returns the default directory for the on-disk mapping cache
pub fn default_cache_dir() -> PathBuf {
    // 1. Check environment variable
    if let Ok(path) = env::var(CACHE_DIR_ENV) {
        return PathBuf::from(path);
    }

    // 2. Use platform-specific cache directory
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("formfill");
    }

    // 3. Fallback to user's home directory
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(".cache").join("formfill");
    }

    // 4. If all else fails, use system temp directory
    env::temp_dir().join("formfill")
}

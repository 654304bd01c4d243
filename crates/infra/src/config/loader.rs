//! Configuration loader
//!
//! Loads SDK configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment if one exists
//! 2. Attempts to load from environment variables
//! 3. If credentials are missing there, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `AIRALO_CLIENT_ID`: Partner client id (required)
//! - `AIRALO_CLIENT_SECRET`: Partner client secret (required)
//! - `AIRALO_ENV`: `sandbox` or `production` (default `production`)
//! - `AIRALO_API_URL`: Base URL override
//! - `AIRALO_HTTP_HEADERS`: Extra headers, `;`-separated `Name: value` lines
//! - `AIRALO_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `AIRALO_WINDOW`: Concurrency window for bulk calls
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./airalo.json` or `./airalo.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use airalo_domain::{AiraloError, Environment, Result, SdkConfig};

use crate::errors::InfraError;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `AiraloError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<SdkConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `AiraloError::Config` if credentials are missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<SdkConfig> {
    let mut config = SdkConfig::new(env_var("AIRALO_CLIENT_ID")?, env_var("AIRALO_CLIENT_SECRET")?);

    if let Some(environment) = env_parse::<Environment>("AIRALO_ENV")? {
        config.environment = environment;
    }

    if let Some(url) = std::env::var("AIRALO_API_URL").ok().filter(|url| !url.trim().is_empty()) {
        config.api_url = Some(url);
    }

    if let Ok(headers) = std::env::var("AIRALO_HTTP_HEADERS") {
        config.http_headers = split_header_lines(&headers);
    }

    if let Some(timeout) = env_parse::<u64>("AIRALO_TIMEOUT_SECS")? {
        config.timeout_secs = timeout;
    }

    if let Some(window) = env_parse::<usize>("AIRALO_WINDOW")? {
        config.window = window;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
///
/// # Errors
/// Returns `AiraloError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<SdkConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AiraloError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AiraloError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents =
        std::fs::read_to_string(&config_path).map_err(|e| AiraloError::from(InfraError::from(e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `AiraloError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<SdkConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| AiraloError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AiraloError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(AiraloError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["airalo.json", "airalo.toml", "config.json", "config.toml"];

    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Split a `;`-separated header list, dropping blanks.
fn split_header_lines(raw: &str) -> Vec<String> {
    raw.split(';').map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `AiraloError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| AiraloError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional environment variable.
///
/// # Errors
/// Returns `AiraloError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AiraloError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

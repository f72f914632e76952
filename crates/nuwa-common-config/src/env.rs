//! Environment variable handling.

use crate::types::{DeployEnvironment, NuwaConfig};
use std::env;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    // Deployment
    pub const NUWA_ENV: &str = "NUWA_ENV";
    pub const NUWA_CONFIG_DIR: &str = "NUWA_CONFIG_DIR";

    // API client overrides
    pub const NUWA_API_BASE_URL: &str = "NUWA_API_BASE_URL";
    pub const NUWA_API_TIMEOUT_MS: &str = "NUWA_API_TIMEOUT_MS";
    pub const NUWA_ENABLE_MOCK: &str = "NUWA_ENABLE_MOCK";

    // Logging
    pub const NUWA_LOG_LEVEL: &str = "NUWA_LOG_LEVEL";
    pub const NUWA_LOG_FORMAT: &str = "NUWA_LOG_FORMAT";
    pub const NUWA_LOG_FILE: &str = "NUWA_LOG_FILE";

    // Locale
    pub const NUWA_LANG: &str = "NUWA_LANG";

    // Development
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const RUST_BACKTRACE: &str = "RUST_BACKTRACE";
}

/// Environment configuration.
pub struct Environment {
    _guard: (), // Prevent construction outside module
}

impl Environment {
    /// Initialize environment from .env files.
    pub fn init() -> Result<Self, EnvError> {
        // Later files override earlier ones
        let _ = dotenvy::from_filename_override(".env");
        let _ = dotenvy::from_filename_override(".env.local");

        if let Ok(env) = env::var(vars::NUWA_ENV) {
            let _ = dotenvy::from_filename_override(format!(".env.{}", env));
        }

        Ok(Self { _guard: () })
    }

    /// Get a required string variable.
    pub fn require(var: &str) -> Result<String, EnvError> {
        env::var(var).map_err(|_| EnvError::NotSet { var: var.to_string() })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get a variable with a default value.
    pub fn get_or(var: &str, default: &str) -> String {
        env::var(var).unwrap_or_else(|_| default.to_string())
    }

    /// Get a boolean variable.
    pub fn get_bool(var: &str) -> Option<bool> {
        env::var(var).ok().map(|v| parse_bool(&v))
    }

    /// Get an integer variable.
    pub fn get_int<T: std::str::FromStr>(var: &str) -> Result<Option<T>, EnvError> {
        match env::var(var) {
            Ok(v) => parse_int(var, &v).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Deployment environment named by `NUWA_ENV`, development when unset or unknown.
    pub fn deploy_environment() -> DeployEnvironment {
        env::var(vars::NUWA_ENV)
            .ok()
            .and_then(|v| DeployEnvironment::parse(&v))
            .unwrap_or_default()
    }

    /// Check if running in development mode.
    pub fn is_development() -> bool {
        Self::deploy_environment() == DeployEnvironment::Development
    }

    /// Check if running in production mode.
    pub fn is_production() -> bool {
        Self::deploy_environment() == DeployEnvironment::Production
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn parse_int<T: std::str::FromStr>(var: &str, v: &str) -> Result<T, EnvError> {
    v.trim().parse().map_err(|_| EnvError::InvalidValue {
        var: var.to_string(),
        message: "expected integer".to_string(),
    })
}

/// Apply `NUWA_*` API overrides from the process environment.
pub fn apply_overrides(config: &mut NuwaConfig) -> Result<(), EnvError> {
    apply_overrides_from(config, |var| env::var(var).ok())
}

/// Apply `NUWA_*` API overrides resolved through `lookup`.
///
/// `NUWA_ENV` only relabels the environment here; preset selection happens
/// in the loader before the file is merged.
pub fn apply_overrides_from<F>(config: &mut NuwaConfig, lookup: F) -> Result<(), EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(vars::NUWA_ENV) {
        config.environment =
            DeployEnvironment::parse(&raw).ok_or_else(|| EnvError::InvalidValue {
                var: vars::NUWA_ENV.to_string(),
                message: format!("unknown environment '{raw}'"),
            })?;
    }

    if let Some(url) = lookup(vars::NUWA_API_BASE_URL) {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }

    if let Some(raw) = lookup(vars::NUWA_API_TIMEOUT_MS) {
        config.api.timeout_ms = parse_int(vars::NUWA_API_TIMEOUT_MS, &raw)?;
    }

    if let Some(raw) = lookup(vars::NUWA_ENABLE_MOCK) {
        config.api.enable_mock = parse_bool(&raw);
    }

    Ok(())
}

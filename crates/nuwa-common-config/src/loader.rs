//! Configuration file loading and parsing.

use crate::env::{self, EnvError};
use crate::types::{DeployEnvironment, NuwaConfig};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR: &str = ".nuwa";
const CONFIG_FILE: &str = "config.yaml";
const ENV_VAR_PATTERN: &str = r"\$\{([^}:]+)(?::-([^}]*))?\}";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error(transparent)]
    Env(#[from] EnvError),
}

impl ConfigError {
    fn parse(e: serde_yaml::Error) -> Self {
        Self::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// Configuration loader.
///
/// Loading starts from the preset of the selected [`DeployEnvironment`]
/// (from `NUWA_ENV`, else the file's `environment` key), layers the YAML
/// file over it, then applies `NUWA_*` overrides.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from `.nuwa/config.yaml` using the process environment.
    pub fn load(&self) -> Result<NuwaConfig, ConfigError> {
        self.load_with(|var| std::env::var(var).ok())
    }

    /// Load configuration, resolving variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<NuwaConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = self.config_path();

        let file_value = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let expanded = expand_env_vars_with(&contents, &lookup)?;
            let value: Value = serde_yaml::from_str(&expanded).map_err(ConfigError::parse)?;
            Some(value)
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using presets");
            None
        };

        let environment = match lookup(env::vars::NUWA_ENV) {
            Some(raw) => parse_environment(&raw)?,
            None => file_value
                .as_ref()
                .and_then(|v| v.get("environment"))
                .and_then(Value::as_str)
                .map(parse_environment)
                .transpose()?
                .unwrap_or_default(),
        };

        let mut config = NuwaConfig::for_environment(environment);
        if let Some(overlay) = file_value {
            let mut base = serde_yaml::to_value(&config).map_err(ConfigError::parse)?;
            merge(&mut base, overlay);
            config = serde_yaml::from_value(base).map_err(ConfigError::parse)?;
            config.environment = environment;
        }

        env::apply_overrides_from(&mut config, &lookup)?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self, config: &NuwaConfig) -> Result<(), ConfigError> {
        let api = &config.api;

        if api.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("api.base_url must not be empty"));
        }
        if api.timeout_ms == 0 {
            return Err(ConfigError::invalid("api.timeout_ms must be greater than 0"));
        }
        if api.retry_count == 0 {
            return Err(ConfigError::invalid("api.retry_count must be at least 1"));
        }
        if api.cache_capacity == 0 {
            return Err(ConfigError::invalid("api.cache_capacity must be at least 1"));
        }
        if api.retry_max_delay_ms < api.retry_base_delay_ms {
            return Err(ConfigError::invalid(
                "api.retry_max_delay_ms must not be less than api.retry_base_delay_ms",
            ));
        }
        if config.translation.timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "translation.timeout_ms must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &NuwaConfig) -> Result<(), ConfigError> {
        let config_dir = self.base_path.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let yaml = serde_yaml::to_string(config).map_err(ConfigError::parse)?;
        std::fs::write(config_dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

fn parse_environment(raw: &str) -> Result<DeployEnvironment, ConfigError> {
    DeployEnvironment::parse(raw).ok_or_else(|| {
        EnvError::InvalidValue {
            var: env::vars::NUWA_ENV.to_string(),
            message: format!("unknown environment '{raw}'"),
        }
        .into()
    })
}

/// Expand `${VAR}` and `${VAR:-default}` using the process environment.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    expand_env_vars_with(content, |var| std::env::var(var).ok())
}

/// Expand `${VAR}` and `${VAR:-default}` using `lookup`.
pub fn expand_env_vars_with<F>(content: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let re = regex::Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::invalid(e.to_string()))?;

    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for cap in re.captures_iter(content) {
        let Some(full) = cap.get(0) else { continue };
        let var_name = &cap[1];

        let value = match (lookup(var_name), cap.get(2)) {
            (Some(v), _) => v,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                return Err(ConfigError::EnvVarNotFound {
                    var: var_name.to_string(),
                })
            }
        };

        result.push_str(&content[last..full.start()]);
        result.push_str(&value);
        last = full.end();
    }

    result.push_str(&content[last..]);
    Ok(result)
}

/// Deep-merge `overlay` into `base`. Mappings merge key by key; anything else replaces.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        // An empty document or a bare `key:` leaves the preset untouched.
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

//! CLI error handling.

use std::process::ExitCode;

use nuwa_common_config::{ConfigError, StoreError};
use nuwa_common_http::{ApiError, ErrorKind};
use nuwa_common_i18n::I18nError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// CLI error type with exit-code mapping
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
        url: Option<String>,
    },

    #[error("{message}")]
    Validation { message: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code: 2 for configuration, 4 for network, 1 otherwise
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Numeric exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Config { .. } => 2,
            Self::Network { .. } => 4,
            Self::Validation { .. } | Self::Other(_) => 1,
        }
    }

    /// Hint shown under the error, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } => hint.as_deref(),
            Self::Network { url: Some(_), .. } => Some("check that the backend is running or set NUWA_API_BASE_URL"),
            _ => None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Network error for a request against `url`
    pub fn network(error: ApiError, url: impl Into<String>) -> Self {
        let mut err = Self::from(error);
        if let Self::Network { url: target, .. } = &mut err {
            *target = Some(url.into());
        }
        err
    }
}

impl From<ApiError> for CliError {
    fn from(error: ApiError) -> Self {
        match error.kind() {
            ErrorKind::Rejected => Self::Other(anyhow::Error::new(error)),
            ErrorKind::Config => Self::Config {
                message: error.to_string(),
                source: Some(Box::new(error)),
                hint: None,
            },
            _ => Self::Network {
                message: error.to_string(),
                source: Some(Box::new(error)),
                url: None,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::Config {
            message: format!("configuration error: {error}"),
            source: Some(Box::new(error)),
            hint: Some("see .nuwa/config.yaml or run `nuwa config show`".to_string()),
        }
    }
}

impl From<I18nError> for CliError {
    fn from(error: I18nError) -> Self {
        Self::Config {
            message: error.to_string(),
            source: Some(Box::new(error)),
            hint: None,
        }
    }
}

impl From<StoreError> for CliError {
    fn from(error: StoreError) -> Self {
        Self::Other(anyhow::Error::new(error))
    }
}

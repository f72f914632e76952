//! Configuration types.

use nuwa_common_core::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Deployment environment. Selects the preset every other section starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployEnvironment {
    #[default]
    Development,
    Production,
    Test,
}

impl DeployEnvironment {
    /// Parse from a string such as `production` or `prod`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            "test" | "testing" => Some(Self::Test),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NuwaConfig {
    /// Deployment environment.
    pub environment: DeployEnvironment,
    /// Backend API client configuration.
    pub api: ApiConfig,
    /// Remote translation configuration.
    pub translation: TranslationConfig,
    /// Client-local storage configuration.
    pub storage: StorageConfig,
}

impl NuwaConfig {
    /// Preset configuration for an environment.
    pub fn for_environment(environment: DeployEnvironment) -> Self {
        Self {
            environment,
            api: ApiConfig::for_environment(environment),
            translation: TranslationConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Base URL the translator posts to.
    pub fn translation_base_url(&self) -> &str {
        self.translation
            .base_url
            .as_deref()
            .unwrap_or(&self.api.base_url)
    }
}

impl Default for NuwaConfig {
    fn default() -> Self {
        Self::for_environment(DeployEnvironment::default())
    }
}

/// Resilient API client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
    /// Maximum attempts made by retrying calls.
    pub retry_count: u32,
    /// Base retry delay (ms); attempt `n` waits `base * 2^n`.
    pub retry_base_delay_ms: u64,
    /// Ceiling on a single retry delay (ms).
    pub retry_max_delay_ms: u64,
    /// Serve fresh successful responses from the in-memory cache.
    pub enable_cache: bool,
    /// Fall back to canned data when the network fails.
    pub enable_mock: bool,
    /// Cache entry lifetime (ms).
    pub cache_ttl_ms: u64,
    /// Maximum number of cached responses.
    pub cache_capacity: usize,
    /// Health probe timeout (ms).
    pub health_timeout_ms: u64,
    /// Share one network call between concurrent identical requests.
    pub dedupe_in_flight: bool,
}

impl ApiConfig {
    /// Preset for an environment.
    pub fn for_environment(environment: DeployEnvironment) -> Self {
        let base = Self::default();
        match environment {
            DeployEnvironment::Development => base,
            DeployEnvironment::Production => Self {
                base_url: "https://api.cybernuwa.com".to_string(),
                timeout_ms: 10_000,
                retry_count: 5,
                enable_mock: false,
                ..base
            },
            DeployEnvironment::Test => Self {
                base_url: "http://localhost:8001".to_string(),
                timeout_ms: 3_000,
                retry_count: 1,
                enable_mock: false,
                ..base
            },
        }
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Health probe timeout.
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Base retry delay.
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Retry delay ceiling.
    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8003".to_string(),
            timeout_ms: 5_000,
            retry_count: 3,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
            enable_cache: true,
            enable_mock: true,
            cache_ttl_ms: 5 * 60 * 1_000,
            cache_capacity: 1_000,
            health_timeout_ms: 3_000,
            dedupe_in_flight: true,
        }
    }
}

/// Remote translation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translation service base URL; the API base URL when unset.
    pub base_url: Option<String>,
    /// Path of the translate endpoint.
    pub endpoint: String,
    /// Per-call timeout (ms).
    pub timeout_ms: u64,
    /// Language used when nothing else is configured.
    pub default_language: Language,
}

impl TranslationConfig {
    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            endpoint: "/api/translation/translate".to_string(),
            timeout_ms: 10_000,
            default_language: Language::default(),
        }
    }
}

/// Client-local storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the local store.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".nuwa/local_storage.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_is_development_preset() {
        let config = NuwaConfig::default();
        assert_eq!(config.environment, DeployEnvironment::Development);
        assert_eq!(config.api.base_url, "http://localhost:8003");
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.api.retry_count, 3);
        assert!(config.api.enable_cache);
        assert!(config.api.enable_mock);
        assert_eq!(config.api.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.api.health_timeout(), Duration::from_secs(3));
        assert_eq!(config.translation.endpoint, "/api/translation/translate");
    }

    #[test]
    fn test_production_preset() {
        let api = ApiConfig::for_environment(DeployEnvironment::Production);
        assert_eq!(api.base_url, "https://api.cybernuwa.com");
        assert_eq!(api.timeout_ms, 10_000);
        assert_eq!(api.retry_count, 5);
        assert!(!api.enable_mock);
        assert!(api.enable_cache);
    }

    #[test]
    fn test_test_preset() {
        let api = ApiConfig::for_environment(DeployEnvironment::Test);
        assert_eq!(api.base_url, "http://localhost:8001");
        assert_eq!(api.retry_count, 1);
        assert!(!api.enable_mock);
    }

    #[test_case("production", Some(DeployEnvironment::Production))]
    #[test_case("PROD", Some(DeployEnvironment::Production))]
    #[test_case("dev", Some(DeployEnvironment::Development))]
    #[test_case("test", Some(DeployEnvironment::Test))]
    #[test_case("staging", None)]
    fn test_environment_parse(input: &str, expected: Option<DeployEnvironment>) {
        assert_eq!(DeployEnvironment::parse(input), expected);
    }

    #[test]
    fn test_translation_base_url_falls_back_to_api() {
        let mut config = NuwaConfig::default();
        assert_eq!(config.translation_base_url(), "http://localhost:8003");
        config.translation.base_url = Some("http://translate.local".into());
        assert_eq!(config.translation_base_url(), "http://translate.local");
    }
}

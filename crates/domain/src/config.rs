//! SDK configuration model

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_WINDOW, PACKAGES_CACHE_TTL_SECS, PRODUCTION_URL, SANDBOX_URL,
    USAGE_CACHE_TTL_SECS,
};
use crate::errors::{AiraloError, Result};
use crate::impl_str_enum_conversions;

/// Target API environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    #[default]
    Production,
}

impl_str_enum_conversions!(Environment {
    Sandbox => "sandbox",
    Production => "production",
});

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_URL,
            Self::Production => PRODUCTION_URL,
        }
    }
}

/// Partner credentials plus transport settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SdkConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default, alias = "env")]
    pub environment: Environment,
    /// Overrides the environment's base URL when set.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Extra `"Name: value"` headers sent with every request.
    #[serde(default)]
    pub http_headers: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Rolling window used for bulk requests.
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_packages_ttl")]
    pub packages_cache_ttl_secs: u64,
    #[serde(default = "default_usage_ttl")]
    pub usage_cache_ttl_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_packages_ttl() -> u64 {
    PACKAGES_CACHE_TTL_SECS
}

fn default_usage_ttl() -> u64 {
    USAGE_CACHE_TTL_SECS
}

impl SdkConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            environment: Environment::default(),
            api_url: None,
            http_headers: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            window: DEFAULT_WINDOW,
            packages_cache_ttl_secs: PACKAGES_CACHE_TTL_SECS,
            usage_cache_ttl_secs: USAGE_CACHE_TTL_SECS,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_http_headers(mut self, headers: Vec<String>) -> Self {
        self.http_headers = headers;
        self
    }

    /// Check mandatory credentials.
    ///
    /// # Errors
    /// Returns `AiraloError::Config` naming the first missing key.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [("client_id", &self.client_id), ("client_secret", &self.client_secret)]
        {
            if value.trim().is_empty() {
                return Err(AiraloError::Config(format!(
                    "Mandatory field `{key}` is missing in the provided config data"
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(AiraloError::Config("timeout_secs must be greater than zero".into()));
        }

        Ok(())
    }

    /// Base URL with a guaranteed trailing slash.
    pub fn base_url(&self) -> String {
        match self.api_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) if url.ends_with('/') => url.to_string(),
            Some(url) => format!("{url}/"),
            None => self.environment.base_url().to_string(),
        }
    }

    /// `client_id=..&client_secret=..` form used to key the token cache.
    pub fn credentials_query(&self) -> String {
        format!("client_id={}&client_secret={}", self.client_id, self.client_secret)
    }
}

// Keep the secret out of debug output.
impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("api_url", &self.api_url)
            .field("http_headers", &self.http_headers)
            .field("timeout_secs", &self.timeout_secs)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_client_id() {
        let err = SdkConfig::new("", "secret").validate().unwrap_err();
        assert_eq!(
            err,
            AiraloError::Config(
                "Mandatory field `client_id` is missing in the provided config data".into()
            )
        );
    }

    #[test]
    fn validate_requires_client_secret() {
        let err = SdkConfig::new("id", "  ").validate().unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn environment_defaults_to_production() {
        let config: SdkConfig =
            serde_json::from_str(r#"{"client_id":"id","client_secret":"secret"}"#).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.base_url(), PRODUCTION_URL);
        assert_eq!(config.window, DEFAULT_WINDOW);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn env_alias_selects_sandbox() {
        let config: SdkConfig =
            serde_json::from_str(r#"{"client_id":"id","client_secret":"s","env":"sandbox"}"#)
                .unwrap();
        assert_eq!(config.base_url(), SANDBOX_URL);
    }

    #[test]
    fn api_url_override_gets_trailing_slash() {
        let config = SdkConfig::new("id", "secret").with_api_url("http://127.0.0.1:8080/v2");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080/v2/");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", SdkConfig::new("id", "super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

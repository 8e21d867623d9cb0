//! Configuration types.
//!
//! - [`TransportConfig`] tunes the hyper transport.
//! - [`ConfigSource`] loads per-client defaults (`url`, `headers`, arbitrary values) from an
//!   external store; [`YamlConfig`] reads them from `<root>/clients/<client>.yml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::{Error, Headers, Result};

// ============================================================================
// Transport
// ============================================================================

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout duration.
    pub timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Whether requests canceled by a closing pooled connection are retried.
    pub retry_canceled_requests: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            retry_canceled_requests: true,
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    retry_canceled_requests: Option<bool>,
}

impl TransportConfigBuilder {
    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set whether canceled requests are retried on a fresh connection.
    #[must_use]
    pub const fn retry_canceled_requests(mut self, retry: bool) -> Self {
        self.retry_canceled_requests = Some(retry);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            retry_canceled_requests: self
                .retry_canceled_requests
                .unwrap_or(defaults.retry_canceled_requests),
        }
    }
}

// ============================================================================
// Client configuration sources
// ============================================================================

/// Externally configured defaults for one client type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfiguration {
    /// Base URL, replaces the declared default.
    pub url: Option<String>,
    /// Headers, merged over the declared default headers.
    pub headers: Headers,
    /// Every other configured key.
    pub values: Map<String, Value>,
}

impl ClientConfiguration {
    /// Split a configuration object into `url`, `headers` and the remaining values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when `url` is not a string or `headers` is not a map.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut values = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(Error::configuration(format!(
                    "expected a map of client defaults, got {other}"
                )));
            }
        };

        let url = match values.remove("url") {
            None | Some(Value::Null) => None,
            Some(Value::String(url)) => Some(url),
            Some(other) => {
                return Err(Error::configuration(format!(
                    "url must be a string, got {other}"
                )));
            }
        };

        let headers = match values.remove("headers") {
            None | Some(Value::Null) => Headers::new(),
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(name, value)| match value {
                    Value::String(text) => (name, text),
                    other => (name, other.to_string()),
                })
                .collect(),
            Some(other) => {
                return Err(Error::configuration(format!(
                    "headers must be a map, got {other}"
                )));
            }
        };

        Ok(Self {
            url,
            headers,
            values,
        })
    }
}

/// A store of per-client defaults keyed by client type name.
pub trait ConfigSource {
    /// Load the configuration of one client type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the stored configuration is malformed.
    fn load(&self, client: &str) -> Result<ClientConfiguration>;
}

/// YAML files under `<root>/clients/<client>.yml`, one top-level key per environment.
///
/// ```yaml
/// development:
///   url: http://localhost:3000
///   headers:
///     Authorization: Bearer dev-token
///   page_size: 50
/// ```
///
/// A missing file, or a file without the selected environment, is an empty configuration.
#[derive(Debug, Clone)]
pub struct YamlConfig {
    root: PathBuf,
    environment: String,
}

impl YamlConfig {
    /// Environment selected unless [`YamlConfig::environment`] says otherwise.
    pub const DEFAULT_ENVIRONMENT: &'static str = "development";

    /// Read configuration files below `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            environment: Self::DEFAULT_ENVIRONMENT.to_string(),
        }
    }

    /// Select the environment key.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Path of a client's configuration file.
    #[must_use]
    pub fn path_for(&self, client: &str) -> PathBuf {
        self.root.join("clients").join(format!("{client}.yml"))
    }
}

impl ConfigSource for YamlConfig {
    fn load(&self, client: &str) -> Result<ClientConfiguration> {
        let path = self.path_for(client);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no client configuration file");
                return Ok(ClientConfiguration::default());
            }
            Err(err) => {
                return Err(Error::configuration(format!(
                    "cannot read {}: {err}",
                    path.display()
                )));
            }
        };

        let document: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|err| Error::configuration(format!("{}: {err}", path.display())))?;
        let Some(section) = document.get(self.environment.as_str()) else {
            return Ok(ClientConfiguration::default());
        };
        let section = serde_json::to_value(section)
            .map_err(|err| Error::configuration(format!("{}: {err}", path.display())))?;

        ClientConfiguration::from_value(section)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_transport_config() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_idle_per_host, 32);
        assert!(config.retry_canceled_requests);
    }

    #[test]
    fn transport_builder_overrides() {
        let config = TransportConfig::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_per_host(16)
            .retry_canceled_requests(false)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.pool_idle_per_host, 16);
        assert!(!config.retry_canceled_requests);
    }

    #[test]
    fn splits_configuration_object() {
        let config = ClientConfiguration::from_value(json!({
            "url": "https://api.example.com",
            "headers": {"X-Api-Key": "secret", "X-Version": 2},
            "page_size": 50,
        }))
        .expect("config");

        assert_eq!(config.url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.headers.get("x-api-key"), Some("secret"));
        assert_eq!(config.headers.get("x-version"), Some("2"));
        assert_eq!(config.values.get("page_size"), Some(&json!(50)));
    }

    #[test]
    fn rejects_malformed_configuration() {
        assert!(ClientConfiguration::from_value(json!({"url": 1})).is_err());
        assert!(ClientConfiguration::from_value(json!({"headers": "nope"})).is_err());
        assert!(ClientConfiguration::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn yaml_environment_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("clients")).expect("clients dir");
        std::fs::write(
            dir.path().join("clients").join("articles.yml"),
            "development:\n  url: http://localhost:3000\nproduction:\n  url: https://api.example.com\n",
        )
        .expect("write");

        let development = YamlConfig::new(dir.path()).load("articles").expect("load");
        assert_eq!(development.url.as_deref(), Some("http://localhost:3000"));

        let production = YamlConfig::new(dir.path())
            .environment("production")
            .load("articles")
            .expect("load");
        assert_eq!(production.url.as_deref(), Some("https://api.example.com"));

        let staging = YamlConfig::new(dir.path())
            .environment("staging")
            .load("articles")
            .expect("load");
        assert_eq!(staging, ClientConfiguration::default());
    }

    #[test]
    fn yaml_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = YamlConfig::new(dir.path()).load("nothing").expect("load");
        assert_eq!(config, ClientConfiguration::default());
    }

    #[test]
    fn yaml_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("clients")).expect("clients dir");
        std::fs::write(dir.path().join("clients").join("broken.yml"), "development: [").expect("write");

        let err = YamlConfig::new(dir.path()).load("broken").expect_err("malformed");
        assert!(matches!(err, Error::Configuration(_)));
    }
}

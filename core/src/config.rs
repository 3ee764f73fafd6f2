//! Client configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Connection settings for the Icinga API.
#[derive(Clone)]
pub struct Config {
    /// URL of the API including port and version prefix,
    /// e.g. `https://icinga.example.com:5665/v1`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Upper bound for a whole call, connect through body read.
    pub timeout: Option<Duration>,
    /// PEM bundle used as the only trust anchors.
    pub ca_cert: Option<PathBuf>,
    /// Skip certificate verification.
    pub insecure: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("reading CA certificate {path:?}: {source}")]
    CaCert {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("building TLS configuration: {0}")]
    Tls(String),
}

impl Config {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            timeout: None,
            ca_cert: None,
            insecure: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Read the configuration from `ICINGA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let mut config = Config::new(
            &required("ICINGA_URL")?,
            &required("ICINGA_USER")?,
            &required("ICINGA_PASSWORD")?,
        );

        if let Some(value) = lookup("ICINGA_TIMEOUT_SECS") {
            let secs: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                name: "ICINGA_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(path) = lookup("ICINGA_CA_CERT") {
            config.ca_cert = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("ICINGA_INSECURE") {
            config.insecure = match value.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ICINGA_INSECURE",
                        value,
                    })
                }
            };
        }
        Ok(config)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("ca_cert", &self.ca_cert)
            .field("insecure", &self.insecure)
            .finish()
    }
}

//! Connection handle for one Icinga API instance.
//!
//! # Design
//! `Icinga` holds only shared, immutable state: the configuration and the
//! transport. It is cheap to clone and safe to share across threads; every
//! call starts from a fresh [`Request`], so nothing leaks between calls.

use std::fmt;
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::http::HttpMethod;
use crate::request::Request;
use crate::transport::{Transport, UreqTransport};

/// Client for the Icinga 2 REST API.
#[derive(Clone)]
pub struct Icinga {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl Icinga {
    /// Connect over HTTPS using the timeout and TLS settings in `config`.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let transport = UreqTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Use a caller-supplied transport.
    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Start a request with an arbitrary method.
    pub fn verb(&self, method: HttpMethod) -> Request<'_> {
        Request::new(self, method)
    }

    pub fn get(&self) -> Request<'_> {
        self.verb(HttpMethod::Get)
    }

    pub fn post(&self) -> Request<'_> {
        self.verb(HttpMethod::Post)
    }

    pub fn put(&self) -> Request<'_> {
        self.verb(HttpMethod::Put)
    }

    pub fn delete(&self) -> Request<'_> {
        self.verb(HttpMethod::Delete)
    }
}

impl fmt::Debug for Icinga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Icinga").field("config", &self.config).finish_non_exhaustive()
    }
}

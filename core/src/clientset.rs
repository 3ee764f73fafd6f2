//! All resource clients over one connection.

use crate::actions::Actions;
use crate::client::Icinga;
use crate::config::{Config, ConfigError};
use crate::hosts::Hosts;
use crate::services::Services;

/// Hosts, services and actions sharing one [`Icinga`] handle.
#[derive(Debug, Clone)]
pub struct ClientSet {
    hosts: Hosts,
    services: Services,
    actions: Actions,
}

impl ClientSet {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Ok(Self::from_client(Icinga::new(config)?))
    }

    pub fn from_client(ic: Icinga) -> Self {
        Self {
            hosts: Hosts::new(ic.clone()),
            services: Services::new(ic.clone()),
            actions: Actions::new(ic),
        }
    }

    pub fn hosts(&self) -> &Hosts {
        &self.hosts
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }
}

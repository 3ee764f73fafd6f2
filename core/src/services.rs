//! Service objects: `objects/services/<host>!<service>`.

use tracing::{debug, info};

use crate::client::Icinga;
use crate::error::{Error, Result};
use crate::model::{service_name, CreateObject, DeleteObject, Service, ServiceAttrs, UpdateObject};
use crate::transport::CallContext;

/// Client for service objects. Services are addressed by host and short name.
#[derive(Debug, Clone)]
pub struct Services {
    ic: Icinga,
}

impl Services {
    pub fn new(ic: Icinga) -> Self {
        Self { ic }
    }

    /// Fetch one service. A missing service is an error with `is_not_found()`.
    pub fn get(&self, ctx: &CallContext, host: &str, service: &str) -> Result<Service> {
        let name = full_name(host, service)?;
        debug!(service = %name, "getting service");
        self.ic
            .get()
            .endpoint("objects")
            .object_type("services")
            .object(&name)
            .call(ctx)
            .bind()
    }

    pub fn create(
        &self,
        ctx: &CallContext,
        host: &str,
        service: &str,
        body: &CreateObject<ServiceAttrs>,
    ) -> Result<()> {
        let name = full_name(host, service)?;
        self.ic
            .put()
            .endpoint("objects")
            .object_type("services")
            .object(&name)
            .json(body)
            .call(ctx)
            .into_error()?;
        info!(service = %name, "created service");
        Ok(())
    }

    /// Create the service unless it already exists.
    ///
    /// Returns `true` when it was created. Any lookup failure other than
    /// not-found is returned unchanged.
    pub fn ensure(
        &self,
        ctx: &CallContext,
        host: &str,
        service: &str,
        body: &CreateObject<ServiceAttrs>,
    ) -> Result<bool> {
        match self.get(ctx, host, service) {
            Ok(_) => {
                debug!(host, service, "service already exists");
                Ok(false)
            }
            Err(err) if err.is_not_found() => {
                self.create(ctx, host, service, body)?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    pub fn update(&self, ctx: &CallContext, host: &str, service: &str, attrs: ServiceAttrs) -> Result<()> {
        let name = full_name(host, service)?;
        self.ic
            .post()
            .endpoint("objects")
            .object_type("services")
            .object(&name)
            .json(&UpdateObject { attrs })
            .call(ctx)
            .into_error()?;
        debug!(service = %name, "updated service");
        Ok(())
    }

    pub fn delete(&self, ctx: &CallContext, host: &str, service: &str, cascade: bool) -> Result<()> {
        let name = full_name(host, service)?;
        self.ic
            .delete()
            .endpoint("objects")
            .object_type("services")
            .object(&name)
            .json(&DeleteObject { cascade })
            .call(ctx)
            .into_error()?;
        info!(service = %name, cascade, "deleted service");
        Ok(())
    }
}

fn full_name(host: &str, service: &str) -> Result<String> {
    if host.is_empty() {
        return Err(Error::NoIdentifier { kind: "host" });
    }
    if service.is_empty() {
        return Err(Error::NoIdentifier { kind: "service" });
    }
    Ok(service_name(host, service))
}

//! Host objects: `objects/hosts/<name>`.

use tracing::{debug, info};

use crate::client::Icinga;
use crate::error::{Error, Result};
use crate::model::{CreateObject, DeleteObject, Host, HostAttrs, UpdateObject};
use crate::transport::CallContext;

/// Client for host objects.
#[derive(Debug, Clone)]
pub struct Hosts {
    ic: Icinga,
}

impl Hosts {
    pub fn new(ic: Icinga) -> Self {
        Self { ic }
    }

    /// Fetch one host. A missing host is an error with `is_not_found()`.
    pub fn get(&self, ctx: &CallContext, name: &str) -> Result<Host> {
        require_name(name)?;
        debug!(host = name, "getting host");
        self.ic
            .get()
            .endpoint("objects")
            .object_type("hosts")
            .object(name)
            .call(ctx)
            .bind()
    }

    pub fn create(&self, ctx: &CallContext, name: &str, body: &CreateObject<HostAttrs>) -> Result<()> {
        require_name(name)?;
        self.ic
            .put()
            .endpoint("objects")
            .object_type("hosts")
            .object(name)
            .json(body)
            .call(ctx)
            .into_error()?;
        info!(host = name, "created host");
        Ok(())
    }

    /// Change attributes of an existing host.
    pub fn update(&self, ctx: &CallContext, name: &str, attrs: HostAttrs) -> Result<()> {
        require_name(name)?;
        self.ic
            .post()
            .endpoint("objects")
            .object_type("hosts")
            .object(name)
            .json(&UpdateObject { attrs })
            .call(ctx)
            .into_error()?;
        debug!(host = name, "updated host");
        Ok(())
    }

    /// Delete a host. With `cascade` its services go too.
    pub fn delete(&self, ctx: &CallContext, name: &str, cascade: bool) -> Result<()> {
        require_name(name)?;
        self.ic
            .delete()
            .endpoint("objects")
            .object_type("hosts")
            .object(name)
            .json(&DeleteObject { cascade })
            .call(ctx)
            .into_error()?;
        info!(host = name, cascade, "deleted host");
        Ok(())
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::NoIdentifier { kind: "host" });
    }
    Ok(())
}

//! Actions: `actions/<name>`.

use tracing::debug;

use crate::client::Icinga;
use crate::error::{Error, Result};
use crate::model::{CheckResult, ProcessCheckResult};
use crate::transport::CallContext;

/// Client for the actions endpoint.
#[derive(Debug, Clone)]
pub struct Actions {
    ic: Icinga,
}

impl Actions {
    pub fn new(ic: Icinga) -> Self {
        Self { ic }
    }

    /// Submit a passive check result for `service` on `host`.
    pub fn process_check_result(
        &self,
        ctx: &CallContext,
        host: &str,
        service: &str,
        result: &CheckResult,
    ) -> Result<()> {
        if host.is_empty() {
            return Err(Error::NoIdentifier { kind: "host" });
        }
        if service.is_empty() {
            return Err(Error::NoIdentifier { kind: "service" });
        }
        self.submit(ctx, &ProcessCheckResult::for_service(host, service, result))?;
        debug!(host, service, exit_status = result.exit_status, "submitted service check result");
        Ok(())
    }

    /// Submit a passive check result for `host` itself.
    pub fn process_host_check_result(&self, ctx: &CallContext, host: &str, result: &CheckResult) -> Result<()> {
        if host.is_empty() {
            return Err(Error::NoIdentifier { kind: "host" });
        }
        self.submit(ctx, &ProcessCheckResult::for_host(host, result))?;
        debug!(host, exit_status = result.exit_status, "submitted host check result");
        Ok(())
    }

    fn submit(&self, ctx: &CallContext, body: &ProcessCheckResult) -> Result<()> {
        self.ic
            .post()
            .endpoint("actions")
            .object("process-check-result")
            .json(body)
            .call(ctx)
            .into_error()
    }
}

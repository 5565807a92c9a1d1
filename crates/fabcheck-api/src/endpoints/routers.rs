// Tenant logical router endpoints
//
// `tenantlogicalrouter/v1` lists every router; the tenant-scoped path
// lists (200 with an empty list for unknown tenants) and creates. The
// system router is created under the `system` tenant.

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::{RouterList, RouterRequest};

impl FabricClient {
    /// `GET tenantlogicalrouter/v1`
    pub async fn list_routers(&self) -> Result<RouterList, Error> {
        self.get("tenantlogicalrouter/v1").await
    }

    /// `GET tenantlogicalrouter/v1/tenants/{tenant}`
    pub async fn list_tenant_routers(&self, tenant: &str) -> Result<RouterList, Error> {
        self.get(&format!("tenantlogicalrouter/v1/tenants/{tenant}"))
            .await
    }

    /// `POST tenantlogicalrouter/v1/tenants/{tenant}`
    ///
    /// Posting to a tenant that does not exist is rejected with HTTP 400.
    pub async fn create_router(&self, tenant: &str, req: &RouterRequest) -> Result<(), Error> {
        debug!(
            tenant,
            router = %req.name,
            interfaces = ?req.interfaces,
            tenant_routers = ?req.tenant_routers,
            "creating logical router"
        );
        self.post(&format!("tenantlogicalrouter/v1/tenants/{tenant}"), req)
            .await
    }

    /// `DELETE tenantlogicalrouter/v1/tenants/{tenant}/{router}`
    pub async fn delete_router(&self, tenant: &str, router: &str) -> Result<(), Error> {
        debug!(tenant, router, "deleting logical router");
        self.delete(&format!("tenantlogicalrouter/v1/tenants/{tenant}/{router}"))
            .await
    }
}

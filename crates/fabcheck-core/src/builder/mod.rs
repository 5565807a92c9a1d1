// ── Configuration builders ──
//
// Each builder accumulates one controller object by value, checks what can
// be checked locally, and pushes it with `build(&Fabric)`. The returned
// handle owns the remote object: `destroy` deletes it and marks the handle
// so a second destroy fails without touching the controller. Handles are
// `Clone`; clones share the destroyed flag, so a copy registered on a
// teardown stack sees an explicit destroy done by the test body.

mod account;
mod dhcp_relay;
mod pppoeia;
mod router;
mod sflow;
mod span;
mod tenant;
mod uplink;
mod vlan;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::CoreError;
use crate::fabric::Fabric;

pub use account::{UserAccount, UserAccountHandle};
pub use dhcp_relay::{DhcpRelay, DhcpRelayHandle};
pub use pppoeia::{PortIntermediateAgent, Pppoeia, PppoeiaHandle};
pub use router::{LogicalRouter, LogicalRouterHandle, PolicyRoute, evaluate_policy_routes};
pub use sflow::{Sflow, SflowHandle, SflowLimits};
pub use span::{Span, SpanHandle};
pub use tenant::{AccessPort, NetworkPort, SegmentMember, Tenant, TenantHandle};
pub use uplink::{UplinkSegment, UplinkSegmentHandle};
pub use vlan::{StaticVlan, StaticVlanHandle, Vlan, VlanHandle};

/// Tenant that owns the system router aggregating per-tenant routers.
pub const SYSTEM_TENANT: &str = "system";

/// Something with a remote lifetime that teardown can delete.
#[async_trait]
pub trait Destroy: Send + Sync {
    /// Delete the remote object. Fails with `AlreadyDestroyed` on a handle
    /// that was already torn down.
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError>;

    fn is_destroyed(&self) -> bool;

    /// Short label for logs, e.g. `tenant t1`.
    fn describe(&self) -> String;
}

/// Shared destroyed flag carried by every handle.
#[derive(Debug, Clone, Default)]
pub(crate) struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub(crate) fn is_destroyed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Claim the destroy. Exactly one caller wins; the rest get
    /// `AlreadyDestroyed`.
    pub(crate) fn claim(&self, kind: &'static str, name: &str) -> Result<(), CoreError> {
        if self.0.swap(true, Ordering::SeqCst) {
            return Err(CoreError::AlreadyDestroyed {
                kind,
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    /// Undo a claim after the delete failed; the object is still there.
    pub(crate) fn release(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Run `delete` under a claim, releasing it if the delete fails.
    pub(crate) async fn destroy_with<F, Fut>(
        &self,
        kind: &'static str,
        name: &str,
        delete: F,
    ) -> Result<(), CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        self.claim(kind, name)?;
        match delete().await {
            Ok(()) => {
                tracing::info!(kind, name, "destroyed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind, name, error = %e, "destroy failed");
                self.release();
                Err(e)
            }
        }
    }
}

/// Classify the result of a push that was expected to be refused.
///
/// A rejection is the expected outcome; acceptance is an error; any other
/// failure (transport, auth) propagates unchanged.
pub(crate) fn expect_rejection(
    result: Result<(), CoreError>,
    kind: &'static str,
    name: &str,
) -> Result<CoreError, CoreError> {
    match result {
        Ok(()) => Err(CoreError::UnexpectedSuccess {
            kind,
            name: name.to_owned(),
        }),
        Err(e) if e.is_rejection() => {
            tracing::debug!(kind, name, error = %e, "push rejected as expected");
            Ok(e)
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn check_unchanged<T: PartialEq + std::fmt::Debug>(
    before: &T,
    after: &T,
) -> Result<(), CoreError> {
    if before == after {
        Ok(())
    } else {
        Err(CoreError::StateChanged {
            before: format!("{before:?}"),
            after: format!("{after:?}"),
        })
    }
}

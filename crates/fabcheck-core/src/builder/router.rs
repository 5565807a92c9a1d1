// Logical routers and policy routes.
//
// A router is pushed as one payload with its nexthop groups, static routes
// and policy routes embedded. The system router lives under the `system`
// tenant and glues per-tenant routers together by `tenant/router` name.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use fabcheck_api::models::{
    IpProtocol, NexthopGroup, PolicyAction, PolicyRouteSpec, RouterRequest, StaticRoute,
};
use ipnetwork::Ipv4Network;
use tracing::info;

use super::{Destroy, Liveness, SYSTEM_TENANT, check_unchanged, expect_rejection};
use crate::error::CoreError;
use crate::fabric::Fabric;

const KIND: &str = "logical router";

// ── Policy routes ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRoute {
    name: String,
    ingress_segments: Vec<String>,
    ingress_ports: Vec<String>,
    action: PolicyAction,
    sequence_no: u32,
    protocols: Vec<IpProtocol>,
    match_ip: Option<Ipv4Network>,
    nexthop: Option<Ipv4Addr>,
}

impl PolicyRoute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingress_segments: Vec::new(),
            ingress_ports: Vec::new(),
            action: PolicyAction::Permit,
            sequence_no: 0,
            protocols: Vec::new(),
            match_ip: None,
            nexthop: None,
        }
    }

    pub fn ingress_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingress_segments.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Ingress ports as `device/port`.
    pub fn ingress_ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingress_ports.extend(ports.into_iter().map(Into::into));
        self
    }

    pub fn action(mut self, action: PolicyAction) -> Self {
        self.action = action;
        self
    }

    pub fn sequence_no(mut self, sequence_no: u32) -> Self {
        self.sequence_no = sequence_no;
        self
    }

    pub fn protocols(mut self, protocols: impl IntoIterator<Item = IpProtocol>) -> Self {
        self.protocols.extend(protocols);
        self
    }

    pub fn match_ip(mut self, network: Ipv4Network) -> Self {
        self.match_ip = Some(network);
        self
    }

    pub fn nexthop(mut self, nexthop: Ipv4Addr) -> Self {
        self.nexthop = Some(nexthop);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> u32 {
        self.sequence_no
    }

    pub fn policy_action(&self) -> PolicyAction {
        self.action
    }

    pub fn next_hop(&self) -> Option<Ipv4Addr> {
        self.nexthop
    }

    /// Whether a flow entering on `segment` via `port` (`device/port`) with
    /// `protocol` toward `dst` is selected by this rule. Empty criteria
    /// match anything.
    pub fn matches(&self, segment: &str, port: &str, protocol: IpProtocol, dst: Ipv4Addr) -> bool {
        (self.ingress_segments.is_empty() || self.ingress_segments.iter().any(|s| s == segment))
            && (self.ingress_ports.is_empty() || self.ingress_ports.iter().any(|p| p == port))
            && (self.protocols.is_empty() || self.protocols.contains(&protocol))
            && self.match_ip.is_none_or(|net| net.contains(dst))
    }

    fn validate(&self) -> Result<(), CoreError> {
        for port in &self.ingress_ports {
            let valid = port
                .rsplit_once('/')
                .is_some_and(|(dev, num)| !dev.is_empty() && num.parse::<u32>().is_ok());
            if !valid {
                return Err(CoreError::validation(
                    "policy_route.ingress_ports",
                    format!("'{port}' is not device/port"),
                ));
            }
        }
        if self.action == PolicyAction::Permit && self.nexthop.is_none() {
            return Err(CoreError::validation(
                "policy_route.nexthop",
                format!("permit rule '{}' needs a nexthop", self.name),
            ));
        }
        Ok(())
    }

    fn spec(&self) -> PolicyRouteSpec {
        PolicyRouteSpec {
            name: self.name.clone(),
            ingress_segments: self.ingress_segments.clone(),
            ingress_ports: self.ingress_ports.clone(),
            action: self.action,
            sequence_no: self.sequence_no,
            protocols: self.protocols.clone(),
            match_ip: self.match_ip.map(|n| n.to_string()),
            nexthop: self.nexthop,
        }
    }
}

/// First rule, in ascending sequence order, that selects the flow. Rules
/// with equal sequence numbers keep their declaration order.
pub fn evaluate_policy_routes<'a>(
    routes: &'a [PolicyRoute],
    segment: &str,
    port: &str,
    protocol: IpProtocol,
    dst: Ipv4Addr,
) -> Option<&'a PolicyRoute> {
    let mut ordered: Vec<&PolicyRoute> = routes.iter().collect();
    ordered.sort_by_key(|r| r.sequence_no);
    ordered
        .into_iter()
        .find(|r| r.matches(segment, port, protocol, dst))
}

// ── Router builder ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LogicalRouter {
    tenant: String,
    request: RouterRequest,
    policy_routes: Vec<PolicyRoute>,
}

impl LogicalRouter {
    pub fn new(name: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            request: RouterRequest {
                name: name.into(),
                ..RouterRequest::default()
            },
            policy_routes: Vec::new(),
        }
    }

    /// Router under the system tenant.
    pub fn system(name: impl Into<String>) -> Self {
        Self::new(name, SYSTEM_TENANT)
    }

    pub fn is_system(&self) -> bool {
        self.tenant == SYSTEM_TENANT
    }

    /// Segment names this router routes between.
    pub fn interfaces<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request
            .interfaces
            .extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn nexthop_group(
        mut self,
        name: impl Into<String>,
        ips: impl IntoIterator<Item = Ipv4Addr>,
    ) -> Self {
        self.request.nexthop_groups.push(NexthopGroup {
            nexthop_group_name: name.into(),
            ip_addresses: ips.into_iter().collect(),
        });
        self
    }

    pub fn static_route(
        mut self,
        name: impl Into<String>,
        dst: Ipv4Addr,
        prefix_len: u8,
        nexthop_group: impl Into<String>,
    ) -> Self {
        self.request.static_routes.push(StaticRoute {
            name: name.into(),
            dst,
            prefix_len,
            nexthop_group: nexthop_group.into(),
        });
        self
    }

    pub fn policy_route(mut self, route: PolicyRoute) -> Self {
        self.policy_routes.push(route);
        self
    }

    /// Per-tenant routers joined by the system router, as `tenant/router`.
    pub fn tenant_routers<I, S>(mut self, routers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request
            .tenant_routers
            .extend(routers.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.request.tenant_routers.is_empty() && !self.is_system() {
            return Err(CoreError::validation(
                "logical_router.tenant_routers",
                format!("only the {SYSTEM_TENANT} tenant may aggregate routers"),
            ));
        }
        for reference in &self.request.tenant_routers {
            let valid = reference
                .split_once('/')
                .is_some_and(|(t, r)| !t.is_empty() && !r.is_empty() && !r.contains('/'));
            if !valid {
                return Err(CoreError::validation(
                    "logical_router.tenant_routers",
                    format!("'{reference}' is not tenant/router"),
                ));
            }
        }
        for route in &self.request.static_routes {
            if route.prefix_len > 32 {
                return Err(CoreError::validation(
                    "static_route.prefix_len",
                    format!("{} exceeds 32", route.prefix_len),
                ));
            }
            let known = self
                .request
                .nexthop_groups
                .iter()
                .any(|g| g.nexthop_group_name == route.nexthop_group);
            if !known {
                return Err(CoreError::validation(
                    "static_route.nexthop_group",
                    format!("'{}' is not declared", route.nexthop_group),
                ));
            }
        }
        for route in &self.policy_routes {
            route.validate()?;
        }
        Ok(())
    }

    /// The single payload pushed for this router.
    pub fn request(&self) -> RouterRequest {
        RouterRequest {
            policy_routes: self.policy_routes.iter().map(PolicyRoute::spec).collect(),
            ..self.request.clone()
        }
    }

    pub async fn build(self, fabric: &Fabric) -> Result<LogicalRouterHandle, CoreError> {
        self.validate()?;
        let request = self.request();
        fabric.client().create_router(&self.tenant, &request).await?;
        info!(
            tenant = %self.tenant,
            router = %request.name,
            interfaces = ?request.interfaces,
            "logical router built"
        );
        Ok(LogicalRouterHandle {
            tenant: self.tenant,
            name: request.name,
            live: Liveness::default(),
        })
    }

    /// Push expecting a refusal; the tenant's router list must not change.
    pub async fn build_not_success(self, fabric: &Fabric) -> Result<CoreError, CoreError> {
        let before = router_names(fabric, &self.tenant).await?;
        let request = self.request();
        let result = fabric.client().create_router(&self.tenant, &request).await;
        if result.is_ok() {
            fabric
                .client()
                .delete_router(&self.tenant, &request.name)
                .await
                .ok();
        }
        let rejection = expect_rejection(result.map_err(CoreError::from), KIND, &request.name)?;
        check_unchanged(&before, &router_names(fabric, &self.tenant).await?)?;
        Ok(rejection)
    }
}

async fn router_names(fabric: &Fabric, tenant: &str) -> Result<Vec<String>, CoreError> {
    let routers = match fabric.tenant_routers(tenant).await {
        Ok(routers) => routers,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e),
    };
    let mut names: Vec<String> = routers.into_iter().map(|r| r.name).collect();
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone)]
pub struct LogicalRouterHandle {
    tenant: String,
    name: String,
    live: Liveness,
}

impl LogicalRouterHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }
}

#[async_trait]
impl Destroy for LogicalRouterHandle {
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        let label = format!("{}/{}", self.tenant, self.name);
        self.live
            .destroy_with(KIND, &label, || async {
                Ok(fabric
                    .client()
                    .delete_router(&self.tenant, &self.name)
                    .await?)
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("logical router {}/{}", self.tenant, self.name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn er0() -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 50, 120)
    }

    #[test]
    fn tenant_routers_only_on_system() {
        let err = LogicalRouter::new("r1", "t1")
            .tenant_routers(["t2/r2"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        assert!(
            LogicalRouter::system("system")
                .tenant_routers(["t1/r1", "t2/r2"])
                .validate()
                .is_ok()
        );
        assert!(
            LogicalRouter::system("system")
                .tenant_routers(["t1"])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn static_route_needs_declared_group() {
        let router = LogicalRouter::new("r1", "t1")
            .interfaces(["s1", "s2"])
            .static_route("static-r1", Ipv4Addr::new(10, 10, 10, 1), 24, "n1");
        assert!(router.validate().is_err());
        let router = router.nexthop_group("n1", [er0()]);
        assert!(router.validate().is_ok());
    }

    #[test]
    fn policy_routes_embedded_in_payload() {
        let pr = PolicyRoute::new("pr1")
            .ingress_segments(["s1"])
            .ingress_ports(["of:11/46"])
            .sequence_no(1)
            .protocols([IpProtocol::Tcp])
            .match_ip("10.10.10.10/32".parse().unwrap())
            .nexthop(er0());
        let req = LogicalRouter::new("r1", "t1")
            .interfaces(["s1", "s2"])
            .policy_route(pr)
            .request();
        assert_eq!(req.policy_routes.len(), 1);
        assert_eq!(req.policy_routes[0].match_ip.as_deref(), Some("10.10.10.10/32"));
        assert_eq!(req.interfaces, vec!["s1", "s2"]);
    }

    #[test]
    fn lowest_sequence_match_wins() {
        let routes = [
            PolicyRoute::new("late")
                .sequence_no(20)
                .nexthop(Ipv4Addr::new(1, 1, 1, 1)),
            PolicyRoute::new("tcp-only")
                .sequence_no(10)
                .protocols([IpProtocol::Tcp])
                .match_ip("10.10.10.10/32".parse().unwrap())
                .nexthop(er0()),
        ];
        let dst = Ipv4Addr::new(10, 10, 10, 10);

        let hit = evaluate_policy_routes(&routes, "s1", "of:11/46", IpProtocol::Tcp, dst).unwrap();
        assert_eq!(hit.name(), "tcp-only");

        let hit = evaluate_policy_routes(&routes, "s1", "of:11/46", IpProtocol::Udp, dst).unwrap();
        assert_eq!(hit.name(), "late");

        let other = Ipv4Addr::new(10, 10, 10, 20);
        let hit =
            evaluate_policy_routes(&routes, "s1", "of:11/46", IpProtocol::Tcp, other).unwrap();
        assert_eq!(hit.name(), "late");
    }

    #[test]
    fn ingress_port_must_be_device_slash_port() {
        let pr = PolicyRoute::new("pr1").ingress_ports(["46"]).nexthop(er0());
        assert!(pr.validate().is_err());
    }
}

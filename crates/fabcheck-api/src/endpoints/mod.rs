// Per-resource endpoint methods on `FabricClient`.

mod accounts;
mod dhcp_relay;
mod pppoeia;
mod routers;
mod sflow;
mod span;
mod tenants;
mod vlan;

//! Fixtures, packet model and dataplane verification for fabric controller
//! conformance tests.
//!
//! A test describes controller objects with fluent builders, pushes them
//! through [`Fabric`], injects synthetic frames through a [`Dataplane`],
//! and asserts on what comes out of other ports:
//!
//! - **[`builder`]**: by-value builders for tenants, segments, logical
//!   routers, DHCP relay, SPAN, sFlow, PPPoE IA, VLANs and user accounts.
//!   `build` returns a handle that owns the remote object; `destroy` deletes
//!   it exactly once.
//!
//! - **[`packet`]**: layered frame construction with checksums and padding,
//!   structural decode, field-level diffs and ignore masks.
//!
//! - **[`Verifier`]**: positive checks poll until a match or timeout;
//!   negative checks watch a port for the full quiescence window.
//!
//! - **[`converge`]**: settle waits, `poll_until`, and master-spine
//!   discovery by ARP.
//!
//! - **[`case`]**: a staged runner that always tears down and reports
//!   teardown failures apart from the primary result.

pub mod builder;
pub mod case;
pub mod converge;
pub mod dataplane;
pub mod error;
pub mod fabric;
pub mod model;
pub mod packet;
pub mod scenarios;
pub mod timing;
pub mod topology;
pub mod verify;

// ── Primary re-exports ──────────────────────────────────────────────
pub use builder::{Destroy, SYSTEM_TENANT};
pub use case::{CaseEnv, CaseError, CaseOutcome, Scenario, Stage, Teardown, TeardownError, TestCase};
pub use dataplane::{CapturedFrame, Dataplane, DataplaneError, Forwarder, LoopbackDataplane};
pub use error::CoreError;
pub use fabric::{Fabric, FabricConfig};
pub use model::{Device, DeviceRole, Host, MacAddress, Nos, Port};
pub use packet::{IgnoreMask, Layer, Packet, PacketError, PacketSpec, ParsedPacket};
pub use timing::Timing;
pub use topology::{StaticTopology, Topology, TopologyKind, TopologyProvider};
pub use verify::{FloodCount, Verifier, VerifyError};

//! Clap derive structures for the `fabcheck` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fabcheck -- inspect a fabric controller and run conformance checks
#[derive(Debug, Parser)]
#[command(
    name = "fabcheck",
    version,
    about = "Inspect fabric controller state and run conformance checks",
    long_about = "Reads tenants, segments, routers, sFlow, PPPoE IA and user accounts\n\
        from a leaf/spine fabric controller, builds test frames, and runs\n\
        self-cleaning configuration checks against it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "FABCHECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Testbed profile to use
    #[arg(long, short = 'p', env = "FABCHECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides the config file)
    #[arg(long, short = 'c', env = "FABCHECK_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Controller user (overrides the config file)
    #[arg(long, short = 'u', env = "FABCHECK_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FABCHECK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FABCHECK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout, e.g. "30s" or "2m"
    #[arg(long, env = "FABCHECK_TIMEOUT", global = true)]
    pub timeout: Option<String>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tenants
    #[command(alias = "t")]
    Tenants(TenantsArgs),

    /// View segments
    #[command(alias = "seg")]
    Segments(SegmentsArgs),

    /// View logical routers
    Routers(RoutersArgs),

    /// View sFlow configuration
    Sflow(SflowArgs),

    /// View PPPoE intermediate agent state
    Pppoeia(PppoeiaArgs),

    /// View controller user accounts
    Users(UsersArgs),

    /// Show the testbed topology of the active profile
    Topology(TopologyArgs),

    /// Build test frames
    Packet(PacketArgs),

    /// Run a self-cleaning conformance check against the controller
    Check(CheckArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Tenants ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TenantsArgs {
    #[command(subcommand)]
    pub command: TenantsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TenantsCommand {
    /// List tenants
    #[command(alias = "ls")]
    List,

    /// Create a tenant
    Create {
        /// Tenant name
        name: String,

        /// Create a System tenant instead of a Normal one
        #[arg(long)]
        system: bool,
    },

    /// Delete a tenant
    #[command(alias = "rm")]
    Delete {
        /// Tenant name
        name: String,
    },
}

// ── Segments / Routers ───────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SegmentsArgs {
    #[command(subcommand)]
    pub command: SegmentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SegmentsCommand {
    /// List segments
    #[command(alias = "ls")]
    List {
        /// Only segments of this tenant
        #[arg(long, short = 't')]
        tenant: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct RoutersArgs {
    #[command(subcommand)]
    pub command: RoutersCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutersCommand {
    /// List logical routers
    #[command(alias = "ls")]
    List {
        /// Only routers of this tenant
        #[arg(long, short = 't')]
        tenant: Option<String>,
    },
}

// ── sFlow / PPPoE IA / Users ─────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SflowArgs {
    #[command(subcommand)]
    pub command: SflowCommand,
}

#[derive(Debug, Subcommand)]
pub enum SflowCommand {
    /// Show sFlow configuration, for one device or all of them
    Show {
        /// Device id
        device: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct PppoeiaArgs {
    #[command(subcommand)]
    pub command: PppoeiaCommand,
}

#[derive(Debug, Subcommand)]
pub enum PppoeiaCommand {
    /// Show delegate devices and per-device status, or one device's ports
    Show {
        /// Show the port settings of this device
        #[arg(long, short = 'd')]
        device: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List user accounts
    #[command(alias = "ls")]
    List {
        /// Only members of this group
        #[arg(long, short = 'g')]
        group: Option<String>,
    },
}

// ── Topology ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TopologyArgs {
    #[command(subcommand)]
    pub command: TopologyCommand,
}

#[derive(Debug, Subcommand)]
pub enum TopologyCommand {
    /// Show devices, hosts and dataplane ports
    Show,
}

// ── Packet ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PacketArgs {
    #[command(subcommand)]
    pub command: PacketCommand,
}

#[derive(Debug, Subcommand)]
pub enum PacketCommand {
    /// Build a frame and print it as hex
    Build(PacketBuildArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PacketKind {
    Tcp,
    Udp,
    Icmp,
    Eth,
    Arp,
    PppoeDiscovery,
}

#[derive(Debug, Args)]
pub struct PacketBuildArgs {
    /// Frame template
    pub kind: PacketKind,

    /// 802.1Q VLAN id
    #[arg(long)]
    pub vlan: Option<u16>,

    /// 802.1Q priority
    #[arg(long)]
    pub pcp: Option<u8>,

    /// Source MAC address
    #[arg(long)]
    pub src_mac: Option<String>,

    /// Destination MAC address
    #[arg(long)]
    pub dst_mac: Option<String>,

    /// Source IPv4 address
    #[arg(long)]
    pub src: Option<Ipv4Addr>,

    /// Destination IPv4 address
    #[arg(long)]
    pub dst: Option<Ipv4Addr>,

    /// Source L4 port
    #[arg(long)]
    pub sport: Option<u16>,

    /// Destination L4 port
    #[arg(long)]
    pub dport: Option<u16>,

    /// IPv4 TTL
    #[arg(long)]
    pub ttl: Option<u8>,

    /// Total frame length before padding
    #[arg(long)]
    pub len: Option<usize>,

    /// Print an offset/hex/ASCII dump instead of a single hex string
    #[arg(long)]
    pub dump: bool,
}

// ── Check ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(subcommand)]
    pub command: CheckCommand,
}

#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// Create a tenant with one segment, read both back, delete, confirm gone
    TenantRoundtrip {
        /// Tenant name to create (must not already exist)
        name: String,

        /// Segment name
        #[arg(long, default_value = "s1")]
        segment: String,

        /// Segment VLAN id
        #[arg(long, default_value = "10")]
        vlan: u32,
    },

    /// Push sFlow, then confirm oversized header lengths are refused
    SflowBoundary {
        /// sFlow collector address
        collector: Ipv4Addr,

        /// Device id (defaults to the first leaf of the profile)
        #[arg(long, short = 'd')]
        device: Option<String>,
    },
}

// ── Config / Completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration (passwords masked)
    Show,

    /// List testbed profiles
    Profiles,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}

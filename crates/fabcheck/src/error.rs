//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fabcheck_config::ConfigError;
use fabcheck_core::{CoreError, PacketError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CHECK_FAILED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(fabcheck::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Reason: {reason}\n\
             Override the URL with --controller or FABCHECK_CONTROLLER."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller request timed out: {message}")]
    #[diagnostic(
        code(fabcheck::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fabcheck::auth_failed),
        help("Verify controller.username and the password in FABCHECK_PASSWORD.")
    )]
    AuthFailed { message: String },

    #[error("No password configured for controller user '{username}'")]
    #[diagnostic(
        code(fabcheck::no_credentials),
        help(
            "Export the password in the variable named by controller.password_env\n\
             (FABCHECK_PASSWORD by default), or set controller.password."
        )
    )]
    NoCredentials { username: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fabcheck::not_found),
        help("Run: fabcheck {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(fabcheck::already_exists))]
    AlreadyExists {
        resource_type: String,
        identifier: String,
    },

    #[error("Controller refused {path}: {message}")]
    #[diagnostic(
        code(fabcheck::dependency_conflict),
        help("Delete the objects that still reference it first (routers, segments, ports).")
    )]
    Conflict { path: String, message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Rejected by controller (HTTP {status}): {message}")]
    #[diagnostic(code(fabcheck::rejected))]
    Rejected { status: u16, message: String },

    #[error("{message}")]
    #[diagnostic(code(fabcheck::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fabcheck::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fabcheck::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Run: fabcheck config path to see which file was read"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(fabcheck::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fabcheck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Checks ───────────────────────────────────────────────────────

    #[error("Check '{name}' failed")]
    #[diagnostic(code(fabcheck::check_failed))]
    CheckFailed { name: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(fabcheck::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(fabcheck::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::AlreadyExists { .. } | Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            Self::CheckFailed { .. } => exit_code::CHECK_FAILED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout { message } => Self::Timeout { message },
            CoreError::NotFound { identifier } => Self::NotFound {
                resource_type: "object".into(),
                identifier,
                list_command: "tenants list".into(),
            },
            CoreError::Rejected { status, message } => Self::Rejected { status, message },
            CoreError::DependencyConflict { path, message } => Self::Conflict { path, message },
            CoreError::Validation { field, reason } => Self::Validation { field, reason },
            CoreError::Config { message } => Self::Config { message },
            other => Self::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<fabcheck_api::Error> for CliError {
    fn from(err: fabcheck_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<PacketError> for CliError {
    fn from(err: PacketError) -> Self {
        Self::Validation {
            field: "packet".into(),
            reason: err.to_string(),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { username } => Self::NoCredentials { username },
            ConfigError::UnknownProfile { name, available } => {
                Self::ProfileNotFound { name, available }
            }
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

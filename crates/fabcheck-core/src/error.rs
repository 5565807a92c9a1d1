// ── Core error types ──
//
// Test-level errors from fabcheck-core. Transport details from the REST
// client are translated by `From<fabcheck_api::Error>` into outcomes a test
// can reason about: the controller refused, a dependency is still in
// place, or the infrastructure itself is unreachable.

use thiserror::Error;

use crate::dataplane::DataplaneError;
use crate::packet::PacketError;
use crate::verify::VerifyError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out: {message}")]
    Timeout { message: String },

    // ── Controller outcomes ──────────────────────────────────────────
    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    /// The controller refused a configuration push (validation failure).
    #[error("Rejected by controller (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// A delete was refused because another object still references the
    /// target. Raised for teardown-order violations.
    #[error("Dependency conflict on {path}: {message}")]
    DependencyConflict { path: String, message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Builder errors ───────────────────────────────────────────────
    /// Local construction check failed before any REST call was issued.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{kind} '{name}' has already been destroyed")]
    AlreadyDestroyed { kind: &'static str, name: String },

    /// `build_not_success` expected a rejection but the push was accepted.
    #[error("{kind} '{name}' was accepted but a rejection was expected")]
    UnexpectedSuccess { kind: &'static str, name: String },

    /// A rejected push still modified the stored configuration.
    #[error("Stored configuration changed after rejected push: before={before}, after={after}")]
    StateChanged { before: String, after: String },

    /// A scenario observed fabric state other than what it asserted.
    #[error("Check failed: {0}")]
    CheckFailed(String),

    // ── Convergence ──────────────────────────────────────────────────
    #[error("Condition not met within {waited_ms}ms: {what}")]
    ConvergenceTimeout { what: String, waited_ms: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No spine answered the ARP probe for {gateway}")]
    NoMasterSpine { gateway: String },

    // ── Packet / dataplane ───────────────────────────────────────────
    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Dataplane(#[from] DataplaneError),

    #[error(transparent)]
    Verify(Box<VerifyError>),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// `true` for outcomes where the controller answered and said no.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. } | Self::DependencyConflict { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<VerifyError> for CoreError {
    fn from(err: VerifyError) -> Self {
        Self::Verify(Box::new(err))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fabcheck_api::Error> for CoreError {
    fn from(err: fabcheck_api::Error) -> Self {
        use fabcheck_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        message: e.to_string(),
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid controller URL: {e}"),
            },
            ApiError::Tls(message) => CoreError::ConnectionFailed {
                url: "<tls>".into(),
                reason: message,
            },
            ApiError::Rejected { status, message } => CoreError::Rejected { status, message },
            ApiError::NotFound { path } => CoreError::NotFound { identifier: path },
            ApiError::DependencyConflict { path, message } => {
                CoreError::DependencyConflict { path, message }
            }
            ApiError::Server { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            ApiError::Deserialization { message, body } => CoreError::Api {
                message: format!("{message} (body: {body})"),
                status: None,
            },
        }
    }
}

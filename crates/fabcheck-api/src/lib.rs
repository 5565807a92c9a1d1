// fabcheck-api: Async Rust client for the fabric controller REST API

pub mod auth;
pub mod client;
mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::{API_PREFIX, FabricClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

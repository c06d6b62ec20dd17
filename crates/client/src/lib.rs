//! Civo API Client
//!
//! A thin async client over the Civo REST API, covering the load balancer
//! and instance endpoints the acceptance suite verifies against.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use client::CivoClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use types::*;

/// Client version, sent in the User-Agent header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

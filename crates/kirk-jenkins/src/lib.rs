//! Jenkins transport for Kirk
//!
//! Implements the [`kirk_core::JobService`] contract over the Jenkins REST
//! API:
//! - `client` - Jenkins API client methods
//! - `connector` - authenticated client construction
//! - `types` - API response types
//! - `config` - job path encoding

mod client;
mod config;
mod connector;
mod types;

pub use client::JenkinsClient;
pub use connector::{
    install_crypto_provider,
    JenkinsConnector,
};

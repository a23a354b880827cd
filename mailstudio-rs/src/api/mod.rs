//! HTTP API fronting the storage facade for server deployments.

pub mod handlers;
pub mod server;

pub use server::ApiServer;

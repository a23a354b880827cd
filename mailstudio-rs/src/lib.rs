//! # mailstudio-rs
//!
//! Storage and delivery backend for an email template studio. Authored
//! emails, a reusable design library and outbound provider configurations
//! are kept behind one storage contract with two interchangeable backends:
//!
//! - **Relational**: SQLite, MySQL or PostgreSQL through a single SQL
//!   adapter, for server deployments
//! - **Embedded**: file-backed JSON collections, for serverless or offline
//!   deployments
//!
//! The HTTP API ([`api`]) exposes the catalog and outbound sending for
//! server mode; the unified client ([`client`]) gives UI code one call
//! surface across both deployment modes. Multi-step save flows are driven
//! by the [`submission`] progress model.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod seed;
pub mod sender;
pub mod storage;
pub mod submission;

pub use config::Config;
pub use error::{Result, StudioError};

//! Persistence layer
//!
//! A single [`StorageAdapter`] contract with two backends selected once at
//! startup:
//! - [`relational`]: SQL databases (SQLite, MySQL, PostgreSQL) via one pool
//! - [`embedded`]: serverless file-backed store with atomic writes
//!
//! The [`facade`] hides the generic collection vocabulary behind typed
//! accessors; the [`factory`] memoizes the process-wide adapter instance.

pub mod adapter;
pub mod embedded;
pub mod facade;
pub mod factory;
pub mod migration;
pub mod relational;

pub use adapter::{QueryOptions, Record, SortDirection, StorageAdapter};
pub use embedded::EmbeddedAdapter;
pub use facade::Storage;
pub use factory::StorageFactory;
pub use migration::Migrator;
pub use relational::RelationalAdapter;

//! Generic persistence contract shared by both backends.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A record as the adapters see it: a flat JSON object. Typed entities only
/// exist above the facade.
pub type Record = serde_json::Map<String, Value>;

/// Collection names. Anything else is a programmer error.
pub mod collections {
    pub const EMAILS: &str = "emails";
    pub const EMAIL_DESIGNS: &str = "emailDesigns";
    pub const EMAIL_PROVIDERS: &str = "emailProviders";

    pub const ALL: [&str; 3] = [EMAILS, EMAIL_DESIGNS, EMAIL_PROVIDERS];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Options for `find_many`. The filter is an equality map with AND
/// semantics; there is no OR and no range matching.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub filter: Option<Record>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QueryOptions {
    pub fn ordered(field: &str, direction: SortDirection) -> Self {
        Self {
            order_by: Some(OrderBy {
                field: field.to_string(),
                direction,
            }),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, field: &str, value: Value) -> Self {
        self.filter
            .get_or_insert_with(Record::new)
            .insert(field.to_string(), value);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Unified persistence contract. Adapters stamp `id`, `createdAt` and
/// `updatedAt` on create and only `updatedAt` on update; they never retry
/// and never swallow errors.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Establish the backing-store handle. Idempotent.
    async fn connect(&self) -> Result<()>;

    /// Release the handle. Safe to call when not connected.
    async fn disconnect(&self) -> Result<()>;

    async fn find_many(&self, collection: &str, options: QueryOptions) -> Result<Vec<Record>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Record>>;

    async fn create(&self, collection: &str, data: Record) -> Result<Record>;

    async fn update(&self, collection: &str, id: &str, patch: Record) -> Result<Record>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

/// Generate an opaque record id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Timestamps are stored as RFC 3339 text with a fixed precision so that
/// lexicographic order matches chronological order.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

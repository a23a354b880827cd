//! Relational storage backend
//!
//! One adapter serves every SQL backend: the connection string decides
//! whether `sqlx` talks to SQLite, MySQL or PostgreSQL. Filtering, sorting
//! and pagination are delegated to the engine's query planner.
//!
//! The engines share no portable default-id mechanism, so ids are UUIDv4
//! stamped here at create time. Timestamps are stored as RFC 3339 text.

use crate::error::{Result, StudioError};
use crate::storage::adapter::{
    new_id, now_timestamp, QueryOptions, Record, SortDirection, StorageAdapter,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::sync::Once;
use tokio::sync::RwLock;
use tracing::info;

static INSTALL_DRIVERS: Once = Once::new();

/// How a column round-trips between the generic JSON record and SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    /// Required string.
    Text,
    /// Nullable string.
    OptText,
    /// Stored as INTEGER 0/1.
    Bool,
    /// Arbitrary JSON document serialized to text.
    Json,
}

struct ColumnSpec {
    field: &'static str,
    column: &'static str,
    kind: ColumnKind,
}

struct TableSpec {
    collection: &'static str,
    table: &'static str,
    columns: &'static [ColumnSpec],
}

const fn col(field: &'static str, column: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        field,
        column,
        kind,
    }
}

const TABLES: [TableSpec; 3] = [
    TableSpec {
        collection: "emails",
        table: "emails",
        columns: &[
            col("title", "title", ColumnKind::Text),
            col("content", "content", ColumnKind::Text),
            col("design", "design", ColumnKind::Text),
            col("preview", "preview", ColumnKind::OptText),
            col("status", "status", ColumnKind::Text),
        ],
    },
    TableSpec {
        collection: "emailDesigns",
        table: "email_designs",
        columns: &[
            col("name", "name", ColumnKind::Text),
            col("description", "description", ColumnKind::Text),
            col("thumbnail", "thumbnail", ColumnKind::Text),
            col("design", "design", ColumnKind::Json),
            col("isActive", "is_active", ColumnKind::Bool),
            col("isSystem", "is_system", ColumnKind::Bool),
        ],
    },
    TableSpec {
        collection: "emailProviders",
        table: "email_providers",
        columns: &[
            col("name", "name", ColumnKind::Text),
            col("type", "provider_type", ColumnKind::Text),
            col("config", "config", ColumnKind::Text),
            col("senderEmail", "sender_email", ColumnKind::Text),
            col("isActive", "is_active", ColumnKind::Bool),
        ],
    },
];

/// Idempotent schema, run on connect. VARCHAR keys keep MySQL happy; the
/// UNIQUE design name is a backstop behind the route-layer pre-check.
const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS emails (
        id VARCHAR(64) PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        design TEXT NOT NULL,
        preview TEXT,
        status VARCHAR(32) NOT NULL,
        created_at VARCHAR(40) NOT NULL,
        updated_at VARCHAR(40) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS email_designs (
        id VARCHAR(64) PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE,
        description TEXT NOT NULL,
        thumbnail TEXT NOT NULL,
        design TEXT NOT NULL,
        is_active INTEGER NOT NULL,
        is_system INTEGER NOT NULL,
        created_at VARCHAR(40) NOT NULL,
        updated_at VARCHAR(40) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS email_providers (
        id VARCHAR(64) PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        provider_type VARCHAR(32) NOT NULL,
        config TEXT NOT NULL,
        sender_email VARCHAR(255) NOT NULL,
        is_active INTEGER NOT NULL,
        created_at VARCHAR(40) NOT NULL,
        updated_at VARCHAR(40) NOT NULL
    )
    "#,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    /// `?` for SQLite and MySQL.
    Question,
    /// `$n` for PostgreSQL.
    Dollar,
}

impl Placeholder {
    fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Placeholder::Dollar
        } else {
            Placeholder::Question
        }
    }

    fn nth(&self, n: usize) -> String {
        match self {
            Placeholder::Question => "?".to_string(),
            Placeholder::Dollar => format!("${}", n),
        }
    }
}

/// A value queued for `sqlx` binding.
enum Bind {
    Text(String),
    OptText(Option<String>),
    I32(i32),
    I64(i64),
}

pub struct RelationalAdapter {
    url: String,
    placeholder: Placeholder,
    pool: RwLock<Option<AnyPool>>,
}

impl RelationalAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let placeholder = Placeholder::from_url(&url);
        Self {
            url,
            placeholder,
            pool: RwLock::new(None),
        }
    }

    fn table(collection: &str) -> Result<&'static TableSpec> {
        TABLES
            .iter()
            .find(|t| t.collection == collection)
            .ok_or_else(|| StudioError::UnknownCollection(collection.to_string()))
    }

    async fn pool(&self) -> Result<AnyPool> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| StudioError::Connection("relational storage not connected".into()))
    }

    /// Map a record field to its column and kind; `id` and the timestamps
    /// are addressable for filtering and ordering.
    fn resolve_field(table: &TableSpec, field: &str) -> Result<(&'static str, ColumnKind)> {
        match field {
            "id" => Ok(("id", ColumnKind::Text)),
            "createdAt" => Ok(("created_at", ColumnKind::Text)),
            "updatedAt" => Ok(("updated_at", ColumnKind::Text)),
            _ => table
                .columns
                .iter()
                .find(|c| c.field == field)
                .map(|c| (c.column, c.kind))
                .ok_or_else(|| {
                    StudioError::Query(format!(
                        "unknown field {} in collection {}",
                        field, table.collection
                    ))
                }),
        }
    }

    /// Convert a JSON value to a bind for the given column kind.
    fn to_bind(table: &TableSpec, field: &str, kind: ColumnKind, value: &Value) -> Result<Bind> {
        let mismatch = || {
            StudioError::Query(format!(
                "field {} in collection {} has incompatible value",
                field, table.collection
            ))
        };

        match kind {
            ColumnKind::Text => match value {
                Value::String(s) => Ok(Bind::Text(s.clone())),
                _ => Err(mismatch()),
            },
            ColumnKind::OptText => match value {
                Value::Null => Ok(Bind::OptText(None)),
                Value::String(s) => Ok(Bind::OptText(Some(s.clone()))),
                _ => Err(mismatch()),
            },
            ColumnKind::Bool => match value {
                Value::Bool(b) => Ok(Bind::I32(*b as i32)),
                _ => Err(mismatch()),
            },
            ColumnKind::Json => Ok(Bind::Text(serde_json::to_string(value)?)),
        }
    }

    /// Filter values additionally accept integers, which compare against
    /// the stored 0/1 encoding of boolean columns.
    fn filter_bind(table: &TableSpec, field: &str, kind: ColumnKind, value: &Value) -> Result<Bind> {
        match value {
            Value::Number(n) => n.as_i64().map(Bind::I64).ok_or_else(|| {
                StudioError::Query(format!(
                    "non-integer numeric filter on {}.{}",
                    table.collection, field
                ))
            }),
            _ => Self::to_bind(table, field, kind, value),
        }
    }

    fn bind_all<'q>(
        query: sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>,
        binds: Vec<Bind>,
    ) -> sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>> {
        let mut query = query;
        for bind in binds {
            query = match bind {
                Bind::Text(s) => query.bind(s),
                Bind::OptText(o) => query.bind(o),
                Bind::I32(i) => query.bind(i),
                Bind::I64(i) => query.bind(i),
            };
        }
        query
    }

    fn select_clause(table: &TableSpec) -> String {
        let mut columns = vec!["id"];
        columns.extend(table.columns.iter().map(|c| c.column));
        columns.push("created_at");
        columns.push("updated_at");
        format!("SELECT {} FROM {}", columns.join(", "), table.table)
    }

    fn row_to_record(table: &TableSpec, row: &AnyRow) -> Result<Record> {
        let mut record = Record::new();

        let id: String = row.try_get("id")?;
        record.insert("id".into(), Value::String(id));

        for spec in table.columns {
            let value = match spec.kind {
                ColumnKind::Text => Value::String(row.try_get::<String, _>(spec.column)?),
                ColumnKind::OptText => match row.try_get::<Option<String>, _>(spec.column)? {
                    Some(s) => Value::String(s),
                    None => Value::Null,
                },
                ColumnKind::Bool => Value::Bool(row.try_get::<i32, _>(spec.column)? != 0),
                ColumnKind::Json => {
                    let raw: String = row.try_get(spec.column)?;
                    serde_json::from_str(&raw).map_err(|e| {
                        StudioError::Parse(format!(
                            "invalid JSON in {}.{}: {}",
                            table.table, spec.column, e
                        ))
                    })?
                }
            };
            record.insert(spec.field.into(), value);
        }

        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;
        record.insert("createdAt".into(), Value::String(created_at));
        record.insert("updatedAt".into(), Value::String(updated_at));

        Ok(record)
    }
}

#[async_trait]
impl StorageAdapter for RelationalAdapter {
    async fn connect(&self) -> Result<()> {
        let mut guard = self.pool.write().await;
        if guard.is_some() {
            return Ok(());
        }

        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(&self.url)
            .await
            .map_err(|e| StudioError::Connection(format!("{}: {}", self.url, e)))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| StudioError::Connection(format!("schema init failed: {}", e)))?;
        }

        info!(url = %self.url, "relational storage connected");
        *guard = Some(pool);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut guard = self.pool.write().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
        }
        Ok(())
    }

    async fn find_many(&self, collection: &str, options: QueryOptions) -> Result<Vec<Record>> {
        let table = Self::table(collection)?;
        let pool = self.pool().await?;

        let mut sql = Self::select_clause(table);
        let mut binds = Vec::new();

        if let Some(filter) = &options.filter {
            let mut clauses = Vec::new();
            for (field, value) in filter {
                let (column, kind) = Self::resolve_field(table, field)?;
                binds.push(Self::filter_bind(table, field, kind, value)?);
                clauses.push(format!("{} = {}", column, self.placeholder.nth(binds.len())));
            }
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
        }

        if let Some(order) = &options.order_by {
            let (column, _) = Self::resolve_field(table, &order.field)?;
            let direction = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", column, direction));
        }

        // Numeric literals: every supported engine takes LIMIT/OFFSET inline
        // and MySQL insists on a LIMIT when OFFSET is present.
        match (options.limit, options.offset) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset.unwrap_or(0)));
            }
            (None, Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", i64::MAX, offset));
            }
            (None, None) => {}
        }

        let rows = Self::bind_all(sqlx::query(&sql), binds)
            .fetch_all(&pool)
            .await?;

        rows.iter().map(|row| Self::row_to_record(table, row)).collect()
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        let table = Self::table(collection)?;
        let pool = self.pool().await?;

        let sql = format!(
            "{} WHERE id = {}",
            Self::select_clause(table),
            self.placeholder.nth(1)
        );

        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_record(table, &row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, collection: &str, data: Record) -> Result<Record> {
        let table = Self::table(collection)?;
        let pool = self.pool().await?;

        let id = new_id();
        let now = now_timestamp();

        let mut columns = vec!["id".to_string()];
        let mut binds = vec![Bind::Text(id.clone())];
        let mut record = Record::new();
        record.insert("id".into(), Value::String(id));

        for spec in table.columns {
            let value = data.get(spec.field).unwrap_or(&Value::Null);
            if value.is_null() && spec.kind != ColumnKind::OptText {
                return Err(StudioError::Query(format!(
                    "missing field {} for collection {}",
                    spec.field, collection
                )));
            }
            binds.push(Self::to_bind(table, spec.field, spec.kind, value)?);
            columns.push(spec.column.to_string());
            record.insert(spec.field.into(), value.clone());
        }

        columns.push("created_at".to_string());
        columns.push("updated_at".to_string());
        binds.push(Bind::Text(now.clone()));
        binds.push(Bind::Text(now.clone()));
        record.insert("createdAt".into(), Value::String(now.clone()));
        record.insert("updatedAt".into(), Value::String(now));

        let placeholders: Vec<String> = (1..=binds.len())
            .map(|n| self.placeholder.nth(n))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.table,
            columns.join(", "),
            placeholders.join(", ")
        );

        Self::bind_all(sqlx::query(&sql), binds)
            .execute(&pool)
            .await?;

        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, patch: Record) -> Result<Record> {
        let table = Self::table(collection)?;
        let pool = self.pool().await?;

        if self.find_by_id(collection, id).await?.is_none() {
            return Err(StudioError::NotFound(format!(
                "record {} not found in {}",
                id, collection
            )));
        }

        // Dynamic SET list: only the supplied fields change.
        let mut assignments = Vec::new();
        let mut binds = Vec::new();

        for (field, value) in &patch {
            if matches!(field.as_str(), "id" | "createdAt" | "updatedAt") {
                continue;
            }
            let (column, kind) = Self::resolve_field(table, field)?;
            binds.push(Self::to_bind(table, field, kind, value)?);
            assignments.push(format!("{} = {}", column, self.placeholder.nth(binds.len())));
        }

        binds.push(Bind::Text(now_timestamp()));
        assignments.push(format!("updated_at = {}", self.placeholder.nth(binds.len())));

        binds.push(Bind::Text(id.to_string()));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = {}",
            table.table,
            assignments.join(", "),
            self.placeholder.nth(binds.len())
        );

        Self::bind_all(sqlx::query(&sql), binds)
            .execute(&pool)
            .await?;

        self.find_by_id(collection, id).await?.ok_or_else(|| {
            StudioError::NotFound(format!("record {} disappeared after update", id))
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let table = Self::table(collection)?;
        let pool = self.pool().await?;

        let sql = format!(
            "DELETE FROM {} WHERE id = {}",
            table.table,
            self.placeholder.nth(1)
        );

        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .execute(&pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StudioError::NotFound(format!(
                "record {} not found in {}",
                id, collection
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_style_follows_url_scheme() {
        assert_eq!(
            Placeholder::from_url("postgres://localhost/studio"),
            Placeholder::Dollar
        );
        assert_eq!(
            Placeholder::from_url("postgresql://localhost/studio"),
            Placeholder::Dollar
        );
        assert_eq!(
            Placeholder::from_url("sqlite://studio.db"),
            Placeholder::Question
        );
        assert_eq!(
            Placeholder::from_url("mysql://localhost/studio"),
            Placeholder::Question
        );
    }

    #[test]
    fn unknown_collection_is_rejected() {
        assert!(matches!(
            RelationalAdapter::table("invoices"),
            Err(StudioError::UnknownCollection(_))
        ));
    }

    #[test]
    fn unknown_filter_field_is_rejected() {
        let table = RelationalAdapter::table("emails").unwrap();
        assert!(RelationalAdapter::resolve_field(table, "title").is_ok());
        assert!(RelationalAdapter::resolve_field(table, "owner").is_err());
    }
}

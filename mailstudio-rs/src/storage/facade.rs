//! Typed facade over the generic adapter
//!
//! Call sites never see the collection-name vocabulary: they get
//! entity-shaped accessors for emails, designs and providers. This is a
//! naming/typing layer only; validation belongs to the callers.

use crate::error::{Result, StudioError};
use crate::models::{
    CreateDesign, CreateEmail, CreateProvider, Email, EmailDesign, EmailProvider, UpdateDesign,
    UpdateEmail, UpdateProvider, DEFAULT_DESIGN_THUMBNAIL,
};
use crate::storage::adapter::{collections, QueryOptions, Record, SortDirection, StorageAdapter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StudioError::Query("expected an object-shaped value".into())),
    }
}

fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn from_records<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records.into_iter().map(from_record).collect()
}

pub struct Storage {
    adapter: Arc<dyn StorageAdapter>,
}

impl Storage {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn connect(&self) -> Result<()> {
        self.adapter.connect().await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.adapter.disconnect().await
    }

    pub fn emails(&self) -> EmailStore {
        EmailStore {
            adapter: Arc::clone(&self.adapter),
        }
    }

    pub fn designs(&self) -> DesignStore {
        DesignStore {
            adapter: Arc::clone(&self.adapter),
        }
    }

    pub fn providers(&self) -> ProviderStore {
        ProviderStore {
            adapter: Arc::clone(&self.adapter),
        }
    }
}

pub struct EmailStore {
    adapter: Arc<dyn StorageAdapter>,
}

impl EmailStore {
    /// All emails, most recently edited first.
    pub async fn find_many(&self) -> Result<Vec<Email>> {
        let records = self
            .adapter
            .find_many(
                collections::EMAILS,
                QueryOptions::ordered("updatedAt", SortDirection::Desc),
            )
            .await?;
        from_records(records)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Email>> {
        match self.adapter.find_by_id(collections::EMAILS, id).await? {
            Some(record) => Ok(Some(from_record(record)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, data: CreateEmail) -> Result<Email> {
        let record = self
            .adapter
            .create(collections::EMAILS, to_record(&data)?)
            .await?;
        from_record(record)
    }

    pub async fn update(&self, id: &str, patch: UpdateEmail) -> Result<Email> {
        let record = self
            .adapter
            .update(collections::EMAILS, id, to_record(&patch)?)
            .await?;
        from_record(record)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.adapter.delete(collections::EMAILS, id).await
    }
}

pub struct DesignStore {
    adapter: Arc<dyn StorageAdapter>,
}

impl DesignStore {
    /// All designs, newest first.
    pub async fn find_many(&self) -> Result<Vec<EmailDesign>> {
        let records = self
            .adapter
            .find_many(
                collections::EMAIL_DESIGNS,
                QueryOptions::ordered("createdAt", SortDirection::Desc),
            )
            .await?;
        from_records(records)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<EmailDesign>> {
        match self
            .adapter
            .find_by_id(collections::EMAIL_DESIGNS, id)
            .await?
        {
            Some(record) => Ok(Some(from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Exact-name lookup, used by the route layer for its uniqueness
    /// pre-check. The adapters themselves do not enforce name uniqueness.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<EmailDesign>> {
        let records = self
            .adapter
            .find_many(
                collections::EMAIL_DESIGNS,
                QueryOptions::default()
                    .with_filter("name", Value::String(name.to_string()))
                    .with_limit(1),
            )
            .await?;
        Ok(from_records(records)?.into_iter().next())
    }

    pub async fn create(&self, data: CreateDesign) -> Result<EmailDesign> {
        let mut record = to_record(&data)?;
        if !record.get("thumbnail").map_or(false, Value::is_string) {
            record.insert(
                "thumbnail".into(),
                Value::String(DEFAULT_DESIGN_THUMBNAIL.to_string()),
            );
        }
        if !record.get("isActive").map_or(false, Value::is_boolean) {
            record.insert("isActive".into(), Value::Bool(true));
        }
        if !record.get("isSystem").map_or(false, Value::is_boolean) {
            record.insert("isSystem".into(), Value::Bool(false));
        }

        let record = self
            .adapter
            .create(collections::EMAIL_DESIGNS, record)
            .await?;
        from_record(record)
    }

    pub async fn update(&self, id: &str, patch: UpdateDesign) -> Result<EmailDesign> {
        let record = self
            .adapter
            .update(collections::EMAIL_DESIGNS, id, to_record(&patch)?)
            .await?;
        from_record(record)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.adapter.delete(collections::EMAIL_DESIGNS, id).await
    }
}

pub struct ProviderStore {
    adapter: Arc<dyn StorageAdapter>,
}

impl ProviderStore {
    /// All providers, newest first.
    pub async fn find_many(&self) -> Result<Vec<EmailProvider>> {
        let records = self
            .adapter
            .find_many(
                collections::EMAIL_PROVIDERS,
                QueryOptions::ordered("createdAt", SortDirection::Desc),
            )
            .await?;
        from_records(records)
    }

    /// Providers currently enabled for sending.
    pub async fn find_active(&self) -> Result<Vec<EmailProvider>> {
        let records = self
            .adapter
            .find_many(
                collections::EMAIL_PROVIDERS,
                QueryOptions::ordered("createdAt", SortDirection::Desc)
                    .with_filter("isActive", Value::Bool(true)),
            )
            .await?;
        from_records(records)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<EmailProvider>> {
        match self
            .adapter
            .find_by_id(collections::EMAIL_PROVIDERS, id)
            .await?
        {
            Some(record) => Ok(Some(from_record(record)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<EmailProvider>> {
        let records = self
            .adapter
            .find_many(
                collections::EMAIL_PROVIDERS,
                QueryOptions::default()
                    .with_filter("name", Value::String(name.to_string()))
                    .with_limit(1),
            )
            .await?;
        Ok(from_records(records)?.into_iter().next())
    }

    pub async fn create(&self, data: CreateProvider) -> Result<EmailProvider> {
        let mut record = to_record(&data)?;
        if !record.get("isActive").map_or(false, Value::is_boolean) {
            record.insert("isActive".into(), Value::Bool(true));
        }

        let record = self
            .adapter
            .create(collections::EMAIL_PROVIDERS, record)
            .await?;
        from_record(record)
    }

    pub async fn update(&self, id: &str, patch: UpdateProvider) -> Result<EmailProvider> {
        let record = self
            .adapter
            .update(collections::EMAIL_PROVIDERS, id, to_record(&patch)?)
            .await?;
        from_record(record)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.adapter.delete(collections::EMAIL_PROVIDERS, id).await
    }
}

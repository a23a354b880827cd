//! Embedded storage backend
//!
//! A serverless store for offline deployments: one JSON document per
//! collection under a data directory, held in memory and written through on
//! every mutation. Writes go to a tmp file first and are renamed into place
//! so a crash mid-write never corrupts a collection.
//!
//! The backing files are only keyed by id, so filtering, sorting and
//! pagination are applied here with a full-collection scan. Records are kept
//! in creation order, which makes the sort stable with respect to creation
//! for equal keys.

use crate::error::{Result, StudioError};
use crate::storage::adapter::{
    collections, new_id, now_timestamp, QueryOptions, Record, SortDirection, StorageAdapter,
};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub struct EmbeddedAdapter {
    data_dir: PathBuf,
    state: RwLock<Option<HashMap<String, Vec<Record>>>>,
}

impl EmbeddedAdapter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            state: RwLock::new(None),
        }
    }

    fn check_collection(collection: &str) -> Result<()> {
        if collections::ALL.contains(&collection) {
            Ok(())
        } else {
            Err(StudioError::UnknownCollection(collection.to_string()))
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection))
    }

    /// Write-through with tmp file + atomic rename.
    async fn persist(&self, collection: &str, records: &[Record]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let path = self.collection_path(collection);
        let tmp_path = self.data_dir.join(format!(".{}.json.tmp", collection));

        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!(collection, count = records.len(), "persisted collection");
        Ok(())
    }

    async fn load_collection(&self, collection: &str) -> Result<Vec<Record>> {
        let path = self.collection_path(collection);
        match fs::read(&path).await {
            Ok(bytes) => {
                let records: Vec<Record> = serde_json::from_slice(&bytes).map_err(|e| {
                    StudioError::Connection(format!(
                        "corrupt collection file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(records)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StudioError::Connection(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Comparator over JSON values for `orderBy`. Mixed-type collections order
/// null < bool < number < string; arrays and objects compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn matches_filter(record: &Record, filter: &Record) -> bool {
    filter
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected))
}

#[async_trait]
impl StorageAdapter for EmbeddedAdapter {
    async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_some() {
            return Ok(());
        }

        fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            StudioError::Connection(format!(
                "failed to create data directory {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let mut loaded = HashMap::new();
        for collection in collections::ALL {
            let records = self.load_collection(collection).await?;
            loaded.insert(collection.to_string(), records);
        }

        info!(data_dir = %self.data_dir.display(), "embedded storage connected");
        *state = Some(loaded);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        *state = None;
        Ok(())
    }

    async fn find_many(&self, collection: &str, options: QueryOptions) -> Result<Vec<Record>> {
        Self::check_collection(collection)?;

        let state = self.state.read().await;
        let store = state
            .as_ref()
            .ok_or_else(|| StudioError::Connection("embedded storage not connected".into()))?;
        // Collections exist after connect; missing here means check_collection drifted.
        let records = store
            .get(collection)
            .ok_or_else(|| StudioError::UnknownCollection(collection.to_string()))?;

        let mut results: Vec<Record> = match &options.filter {
            Some(filter) => records
                .iter()
                .filter(|r| matches_filter(r, filter))
                .cloned()
                .collect(),
            None => records.clone(),
        };

        if let Some(order) = &options.order_by {
            // sort_by is stable: equal keys retain relative creation order.
            results.sort_by(|a, b| {
                let va = a.get(&order.field).unwrap_or(&Value::Null);
                let vb = b.get(&order.field).unwrap_or(&Value::Null);
                match order.direction {
                    SortDirection::Asc => compare_values(va, vb),
                    SortDirection::Desc => compare_values(vb, va),
                }
            });
        }

        let len = results.len();
        let start = options.offset.unwrap_or(0).min(len);
        let end = match options.limit {
            Some(limit) => (start + limit).min(len),
            None => len,
        };

        Ok(results[start..end].to_vec())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        Self::check_collection(collection)?;

        let state = self.state.read().await;
        let store = state
            .as_ref()
            .ok_or_else(|| StudioError::Connection("embedded storage not connected".into()))?;
        let records = store
            .get(collection)
            .ok_or_else(|| StudioError::UnknownCollection(collection.to_string()))?;

        Ok(records
            .iter()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .cloned())
    }

    async fn create(&self, collection: &str, data: Record) -> Result<Record> {
        Self::check_collection(collection)?;

        let mut state = self.state.write().await;
        let store = state
            .as_mut()
            .ok_or_else(|| StudioError::Connection("embedded storage not connected".into()))?;
        let records = store
            .get_mut(collection)
            .ok_or_else(|| StudioError::UnknownCollection(collection.to_string()))?;

        let mut record = data;
        let now = now_timestamp();
        record.insert("id".into(), Value::String(new_id()));
        record.insert("createdAt".into(), Value::String(now.clone()));
        record.insert("updatedAt".into(), Value::String(now));

        // Persist under the write lock, and commit to memory only after the
        // write-through lands, so memory and disk never diverge.
        let mut snapshot = records.clone();
        snapshot.push(record.clone());
        self.persist(collection, &snapshot).await?;
        *records = snapshot;
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, patch: Record) -> Result<Record> {
        Self::check_collection(collection)?;

        let mut state = self.state.write().await;
        let store = state
            .as_mut()
            .ok_or_else(|| StudioError::Connection("embedded storage not connected".into()))?;
        let records = store
            .get_mut(collection)
            .ok_or_else(|| StudioError::UnknownCollection(collection.to_string()))?;

        let position = records
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| {
                StudioError::NotFound(format!("record {} not found in {}", id, collection))
            })?;

        let mut updated = records[position].clone();
        for (field, value) in patch {
            if field == "id" {
                continue;
            }
            updated.insert(field, value);
        }
        updated.insert("updatedAt".into(), Value::String(now_timestamp()));

        let mut snapshot = records.clone();
        snapshot[position] = updated.clone();
        self.persist(collection, &snapshot).await?;
        *records = snapshot;
        Ok(updated)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        Self::check_collection(collection)?;

        let mut state = self.state.write().await;
        let store = state
            .as_mut()
            .ok_or_else(|| StudioError::Connection("embedded storage not connected".into()))?;
        let records = store
            .get_mut(collection)
            .ok_or_else(|| StudioError::UnknownCollection(collection.to_string()))?;

        let position = records
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| {
                StudioError::NotFound(format!("record {} not found in {}", id, collection))
            })?;

        let mut snapshot = records.clone();
        snapshot.remove(position);
        self.persist(collection, &snapshot).await?;
        *records = snapshot;
        Ok(())
    }
}

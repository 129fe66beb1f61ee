//! In-process document and blob store adapters.
//!
//! Backs the test suites and the sitemap batch tool with the same capability
//! surface the hosted backend provides: collection queries with equality and
//! array-contains-any filters, shallow-merge updates, and atomic counter
//! increments on single documents.

use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::application::store::{
    BlobStore, Document, DocumentStore, Filter, FilterOp, OrderBy, OrderDirection, StoreError,
};

#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, DashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document under a caller-chosen id. Fixture helper.
    pub fn insert_with_id(&self, collection: &str, id: &str, data: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let Some(documents) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = documents
            .iter()
            .filter(|entry| filters.iter().all(|filter| matches(entry.value(), filter)))
            .map(|entry| Document {
                id: entry.key().clone(),
                data: entry.value().clone(),
            })
            .collect();

        match order_by {
            Some(order) => {
                matched.sort_by(|a, b| {
                    let ordering = compare_values(a.data.get(&order.field), b.data.get(&order.field))
                        .then_with(|| a.id.cmp(&b.id));
                    match order.direction {
                        OrderDirection::Asc => ordering,
                        OrderDirection::Desc => ordering.reverse(),
                    }
                });
            }
            None => matched.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        if let Some(limit) = limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        self.collections
            .get(collection)
            .and_then(|documents| {
                documents.get(id).map(|entry| Document {
                    id: id.to_string(),
                    data: entry.value().clone(),
                })
            })
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        let documents = self.collections.get(collection).ok_or(StoreError::NotFound)?;
        let mut entry = documents.get_mut(id).ok_or(StoreError::NotFound)?;

        match (entry.as_object_mut(), data.as_object()) {
            (Some(existing), Some(patch)) => {
                for (key, value) in patch {
                    existing.insert(key.clone(), value.clone());
                }
            }
            _ => *entry = data,
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        if let Some(documents) = self.collections.get(collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        let documents = self.collections.get(collection).ok_or(StoreError::NotFound)?;
        let mut entry = documents.get_mut(id).ok_or(StoreError::NotFound)?;

        let Some(object) = entry.as_object_mut() else {
            return Err(StoreError::unavailable("document body is not an object"));
        };

        let current = object.get(field).and_then(Value::as_i64).unwrap_or(0);
        object.insert(field.to_string(), Value::from(current + delta));
        Ok(())
    }
}

fn matches(data: &Value, filter: &Filter) -> bool {
    let field = data.get(&filter.field);
    match filter.op {
        FilterOp::Eq => field == Some(&filter.value),
        FilterOp::ArrayContainsAny => {
            let (Some(Value::Array(haystack)), Value::Array(needles)) = (field, &filter.value)
            else {
                return false;
            };
            needles.iter().any(|needle| haystack.contains(needle))
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

pub struct MemoryBlobStore {
    base_url: String,
    blobs: DashMap<String, (String, Vec<u8>)>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: DashMap::new(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.key_for(url)
            .map(|key| self.blobs.contains_key(&key))
            .unwrap_or(false)
    }

    fn key_for(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.base_url)
            .map(|path| path.trim_start_matches('/').to_string())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError> {
        let key = path.trim_start_matches('/').to_string();
        let url = format!("{}/{}", self.base_url, key);
        self.blobs
            .insert(key, (content_type.to_string(), bytes.to_vec()));
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StoreError> {
        let key = self.key_for(url).ok_or(StoreError::NotFound)?;
        self.blobs.remove(&key).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}

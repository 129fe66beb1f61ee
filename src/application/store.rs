//! Document and blob storage seam over the hosted backend.
//!
//! The core never talks to a concrete backend directly; it consumes these
//! capability traits and leaves persistence, querying, and blob storage to
//! whichever adapter is injected. Filters cover the two operators the site
//! actually uses: field equality and array-contains-any.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Names of the hosted collections.
pub mod collections {
    pub const POSTS: &str = "posts";
    pub const CATEGORIES: &str = "categories";
    pub const COMMENTS: &str = "comments";
    pub const NEWSLETTER: &str = "newsletter";
    pub const ACTIVITY: &str = "activity";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    ArrayContainsAny,
}

/// A single query constraint on a top-level document field.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn array_contains_any(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::ArrayContainsAny,
            value: Value::from(values),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// A stored document: the store-assigned opaque id plus the document body.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decode the document body into a typed record.
    ///
    /// The id lives outside the body; callers inject it into the decoded
    /// record themselves.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Capability set of the hosted document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order_by: Option<&OrderBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError>;

    async fn create(&self, collection: &str, data: Value) -> Result<String, StoreError>;

    /// Shallow-merge the provided fields into an existing document.
    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Atomically add `delta` to a numeric field, creating it when absent.
    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError>;
}

/// Capability set of the hosted blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError>;

    async fn delete(&self, url: &str) -> Result<(), StoreError>;
}

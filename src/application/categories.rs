//! Category management over the document store.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::activity::ActivityService;
use crate::application::store::{Document, DocumentStore, Filter, StoreError, collections};
use crate::domain::entities::{CategoryRecord, SubcategoryEntry};
use crate::domain::slug::{SlugError, derive_slug};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category not found")]
    NotFound,
    #[error("subcategory not found")]
    SubcategoryNotFound,
    #[error("subcategory with slug `{slug}` already exists")]
    DuplicateSubcategory { slug: String },
    #[error("missing required field `{0}`")]
    Validation(&'static str),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CategoryError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => CategoryError::NotFound,
            other => CategoryError::Store(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub name: String,
    /// Explicit slug; derived from the name when absent.
    pub slug: Option<String>,
    pub description: String,
    pub subcategories: Vec<SubcategoryEntry>,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryParams {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub subcategories: Vec<SubcategoryEntry>,
}

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn DocumentStore>,
    activity: ActivityService,
}

impl CategoryService {
    pub fn new(store: Arc<dyn DocumentStore>, activity: ActivityService) -> Self {
        Self { store, activity }
    }

    pub async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, CategoryError> {
        if params.name.trim().is_empty() {
            return Err(CategoryError::Validation("name"));
        }

        let slug = match params.slug {
            Some(slug) if !slug.trim().is_empty() => slug,
            _ => derive_slug(&params.name).map_err(|error| match error {
                SlugError::EmptyInput | SlugError::Unrepresentable { .. } => {
                    CategoryError::Validation("name")
                }
            })?,
        };

        let now = OffsetDateTime::now_utc();
        let mut record = CategoryRecord {
            id: String::new(),
            name: params.name,
            slug,
            description: params.description,
            subcategories: params.subcategories,
            post_count: 0,
            created_at: now,
            updated_at: now,
        };

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        record.id = self.store.create(collections::CATEGORIES, data).await?;

        self.activity
            .record(
                "category_created",
                format!("Category \"{}\" created", record.name),
                Some(&record.id),
            )
            .await;

        Ok(record)
    }

    pub async fn update_category(
        &self,
        id: &str,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, CategoryError> {
        if params.name.trim().is_empty() {
            return Err(CategoryError::Validation("name"));
        }
        if params.slug.trim().is_empty() {
            return Err(CategoryError::Validation("slug"));
        }

        let mut record = self.find_by_id(id).await?;
        record.name = params.name;
        record.slug = params.slug;
        record.description = params.description;
        record.subcategories = params.subcategories;
        record.updated_at = OffsetDateTime::now_utc();

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store.update(collections::CATEGORIES, id, data).await?;

        self.activity
            .record(
                "category_updated",
                format!("Category \"{}\" updated", record.name),
                Some(id),
            )
            .await;

        Ok(record)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), CategoryError> {
        let record = self.find_by_id(id).await?;
        self.store.delete(collections::CATEGORIES, id).await?;

        self.activity
            .record(
                "category_deleted",
                format!("Category \"{}\" deleted", record.name),
                Some(id),
            )
            .await;

        Ok(())
    }

    /// All categories. Degrades to an empty list when the store is
    /// unavailable so listings render as placeholders instead of failing.
    pub async fn list_categories(&self) -> Vec<CategoryRecord> {
        let documents = match self
            .store
            .query(collections::CATEGORIES, &[], None, None)
            .await
        {
            Ok(documents) => documents,
            Err(error) => {
                warn!(error = %error, "failed to list categories");
                return Vec::new();
            }
        };

        documents
            .into_iter()
            .filter_map(|document| match decode_category(&document) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(id = %document.id, error = %error, "skipping undecodable category");
                    None
                }
            })
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<CategoryRecord, CategoryError> {
        let document = self.store.get(collections::CATEGORIES, id).await?;
        Ok(decode_category(&document)?)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<CategoryRecord, CategoryError> {
        let filters = [Filter::eq("slug", slug)];
        let documents = self
            .store
            .query(collections::CATEGORIES, &filters, None, Some(1))
            .await?;

        let document = documents.first().ok_or(CategoryError::NotFound)?;
        Ok(decode_category(document)?)
    }

    /// Add a subcategory; its slug must be unique within the parent.
    pub async fn add_subcategory(
        &self,
        category_id: &str,
        entry: SubcategoryEntry,
    ) -> Result<CategoryRecord, CategoryError> {
        if entry.name.trim().is_empty() {
            return Err(CategoryError::Validation("name"));
        }
        if entry.slug.trim().is_empty() {
            return Err(CategoryError::Validation("slug"));
        }

        let mut record = self.find_by_id(category_id).await?;
        if record.subcategories.iter().any(|sub| sub.slug == entry.slug) {
            return Err(CategoryError::DuplicateSubcategory { slug: entry.slug });
        }

        let description = format!(
            "Subcategory \"{}\" added to \"{}\"",
            entry.name, record.name
        );
        record.subcategories.push(entry);
        record.updated_at = OffsetDateTime::now_utc();

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store
            .update(collections::CATEGORIES, category_id, data)
            .await?;

        self.activity
            .record("subcategory_added", description, Some(category_id))
            .await;

        Ok(record)
    }

    pub async fn remove_subcategory(
        &self,
        category_id: &str,
        subcategory_slug: &str,
    ) -> Result<CategoryRecord, CategoryError> {
        let mut record = self.find_by_id(category_id).await?;

        let removed = record
            .subcategories
            .iter()
            .find(|sub| sub.slug == subcategory_slug)
            .cloned()
            .ok_or(CategoryError::SubcategoryNotFound)?;

        record.subcategories.retain(|sub| sub.slug != subcategory_slug);
        record.updated_at = OffsetDateTime::now_utc();

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store
            .update(collections::CATEGORIES, category_id, data)
            .await?;

        self.activity
            .record(
                "subcategory_removed",
                format!(
                    "Subcategory \"{}\" removed from \"{}\"",
                    removed.name, record.name
                ),
                Some(category_id),
            )
            .await;

        Ok(record)
    }
}

/// Move a category's denormalized post counter by `delta`.
///
/// Counter drift is preferable to failing the post write, so unknown
/// categories and store failures are logged and ignored.
pub(crate) async fn adjust_post_count(store: &dyn DocumentStore, category_slug: &str, delta: i64) {
    let filters = [Filter::eq("slug", category_slug)];
    let documents = match store
        .query(collections::CATEGORIES, &filters, None, Some(1))
        .await
    {
        Ok(documents) => documents,
        Err(error) => {
            warn!(category = category_slug, error = %error, "failed to look up category for post count");
            return;
        }
    };

    let Some(document) = documents.first() else {
        warn!(category = category_slug, "category not found while adjusting post count");
        return;
    };

    if let Err(error) = store
        .increment_field(collections::CATEGORIES, &document.id, "postCount", delta)
        .await
    {
        warn!(category = category_slug, delta, error = %error, "failed to adjust category post count");
    }
}

fn decode_category(document: &Document) -> Result<CategoryRecord, StoreError> {
    let mut record: CategoryRecord = document.decode()?;
    record.id = document.id.clone();
    Ok(record)
}

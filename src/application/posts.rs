//! Post management: slug lifecycle, lookups, and admin mutations.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::activity::ActivityService;
use crate::application::categories;
use crate::application::store::{
    BlobStore, Document, DocumentStore, Filter, OrderBy, OrderDirection, StoreError, collections,
};
use crate::domain::entities::PostRecord;
use crate::domain::slug::{SlugError, derive_slug, ensure_unique_slug_async};
use crate::domain::types::PostStatus;

const WORDS_PER_MINUTE: usize = 200;
const EXCERPT_MAX_CHARS: usize = 150;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,
    #[error("missing required field `{0}`")]
    Validation(&'static str),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for PostError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => PostError::NotFound,
            other => PostError::Store(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub author: Option<String>,
    pub author_img: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub publish_date: Option<OffsetDateTime>,
    pub status: Option<PostStatus>,
    pub featured: bool,
    pub sticky: bool,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostParams {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub publish_date: Option<OffsetDateTime>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
    pub sticky: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PostQuery {
    pub page: usize,
    pub page_size: usize,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Vec<String>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub order_field: String,
    pub order_direction: OrderDirection,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            category: None,
            subcategory: None,
            tags: Vec::new(),
            status: None,
            featured: None,
            search: None,
            order_field: "publishDate".to_string(),
            order_direction: OrderDirection::Desc,
        }
    }
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    activity: ActivityService,
}

impl PostService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        activity: ActivityService,
    ) -> Self {
        Self {
            store,
            blobs,
            activity,
        }
    }

    /// Find a slug not taken by any other post, probing the store one
    /// candidate at a time and suffixing `-1`, `-2`, … on collision.
    ///
    /// When the probe itself fails the base slug is returned unmodified:
    /// the write goes through rather than blocking on the outage, at the
    /// cost of a possible duplicate. Known weak invariant.
    pub async fn ensure_unique_slug(&self, base: &str, exclude_id: Option<&str>) -> String {
        let result = ensure_unique_slug_async(base, |candidate| {
            let store = self.store.clone();
            let exclude = exclude_id.map(str::to_string);
            async move {
                counter!("codetocrack_slug_probe_total").increment(1);
                let filters = [Filter::eq("slug", candidate.as_str())];
                let documents = store
                    .query(collections::POSTS, &filters, None, Some(1))
                    .await?;
                Ok::<bool, StoreError>(match documents.first() {
                    None => true,
                    Some(existing) => exclude.as_deref() == Some(existing.id.as_str()),
                })
            }
        })
        .await;

        match result {
            Ok(slug) => slug,
            Err(error) => {
                warn!(base, error = %error, "slug uniqueness probe failed, keeping base slug");
                base.to_string()
            }
        }
    }

    /// Public lookup: only published posts are reachable by slug. Counts a
    /// view on success.
    pub async fn find_published_by_slug(&self, slug: &str) -> Result<PostRecord, PostError> {
        let filters = [
            Filter::eq("slug", slug),
            Filter::eq("status", PostStatus::Published.as_str()),
        ];
        let documents = self
            .store
            .query(collections::POSTS, &filters, None, Some(1))
            .await?;

        let document = documents.first().ok_or(PostError::NotFound)?;
        let record = decode_post(document)?;
        self.increment_views(&record.id).await;
        Ok(record)
    }

    /// Admin lookup by store id; no status filter. Counts a view on success.
    pub async fn find_by_id(&self, id: &str) -> Result<PostRecord, PostError> {
        let record = self.fetch_raw(id).await?;
        self.increment_views(&record.id).await;
        Ok(record)
    }

    pub async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, PostError> {
        ensure_non_empty(&params.title, "title")?;
        ensure_non_empty(&params.content, "content")?;

        let base = derive_slug(&params.title).map_err(|error| match error {
            SlugError::EmptyInput | SlugError::Unrepresentable { .. } => {
                PostError::Validation("title")
            }
        })?;
        let slug = self.ensure_unique_slug(&base, None).await;

        let now = OffsetDateTime::now_utc();
        let excerpt = match params.excerpt.filter(|excerpt| !excerpt.trim().is_empty()) {
            Some(excerpt) => excerpt,
            None => generate_excerpt(&params.content, EXCERPT_MAX_CHARS),
        };

        let mut record = PostRecord {
            id: String::new(),
            slug: Some(slug),
            title: params.title,
            read_time: calculate_read_time(&params.content),
            content: params.content,
            excerpt,
            category: params.category,
            subcategory: params.subcategory,
            author: params.author,
            author_img: params.author_img,
            featured_image: params.featured_image,
            tags: params.tags,
            publish_date: params.publish_date.unwrap_or(now),
            last_updated: Some(now),
            views: 0,
            likes: 0,
            featured: params.featured,
            sticky: params.sticky,
            status: params.status.unwrap_or(PostStatus::Published),
        };

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        record.id = self.store.create(collections::POSTS, data).await?;

        if let Some(category) = &record.category {
            categories::adjust_post_count(self.store.as_ref(), category, 1).await;
        }

        self.activity
            .record(
                "post_created",
                format!("Post \"{}\" created", record.title),
                Some(&record.id),
            )
            .await;

        Ok(record)
    }

    /// Apply a partial update. The slug is re-derived (and re-uniqued,
    /// excluding this record) only when the title actually changed.
    pub async fn update_post(
        &self,
        id: &str,
        params: UpdatePostParams,
    ) -> Result<PostRecord, PostError> {
        let current = self.fetch_raw(id).await?;
        let mut record = current.clone();

        if let Some(title) = params.title {
            ensure_non_empty(&title, "title")?;
            if title != current.title {
                let base = derive_slug(&title).map_err(|error| match error {
                    SlugError::EmptyInput | SlugError::Unrepresentable { .. } => {
                        PostError::Validation("title")
                    }
                })?;
                record.slug = Some(self.ensure_unique_slug(&base, Some(id)).await);
            }
            record.title = title;
        }

        if let Some(content) = params.content {
            ensure_non_empty(&content, "content")?;
            if content != current.content {
                record.read_time = calculate_read_time(&content);
                if params.excerpt.is_none() {
                    record.excerpt = generate_excerpt(&content, EXCERPT_MAX_CHARS);
                }
            }
            record.content = content;
        }

        if let Some(excerpt) = params.excerpt {
            record.excerpt = excerpt;
        }
        if let Some(category) = params.category.clone() {
            record.category = Some(category);
        }
        if let Some(subcategory) = params.subcategory {
            record.subcategory = Some(subcategory);
        }
        if let Some(featured_image) = params.featured_image {
            record.featured_image = Some(featured_image);
        }
        if let Some(tags) = params.tags {
            record.tags = tags;
        }
        if let Some(publish_date) = params.publish_date {
            record.publish_date = publish_date;
        }
        if let Some(status) = params.status {
            record.status = status;
        }
        if let Some(featured) = params.featured {
            record.featured = featured;
        }
        if let Some(sticky) = params.sticky {
            record.sticky = sticky;
        }
        record.last_updated = Some(OffsetDateTime::now_utc());

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store.update(collections::POSTS, id, data).await?;

        if let Some(new_category) = params.category {
            if current.category.as_deref() != Some(new_category.as_str()) {
                categories::adjust_post_count(self.store.as_ref(), &new_category, 1).await;
                if let Some(old_category) = &current.category {
                    categories::adjust_post_count(self.store.as_ref(), old_category, -1).await;
                }
            }
        }

        self.activity
            .record(
                "post_updated",
                format!("Post \"{}\" updated", record.title),
                Some(id),
            )
            .await;

        Ok(record)
    }

    /// Remove a post. The featured image blob is deleted best-effort before
    /// the document goes away.
    pub async fn delete_post(&self, id: &str) -> Result<(), PostError> {
        let record = self.fetch_raw(id).await?;

        if let Some(image) = &record.featured_image {
            if let Err(error) = self.blobs.delete(image).await {
                warn!(post = id, error = %error, "failed to delete featured image");
            }
        }

        self.store.delete(collections::POSTS, id).await?;

        if let Some(category) = &record.category {
            categories::adjust_post_count(self.store.as_ref(), category, -1).await;
        }

        self.activity
            .record(
                "post_deleted",
                format!("Post \"{}\" deleted", record.title),
                Some(id),
            )
            .await;

        Ok(())
    }

    /// Filtered, searched, manually paginated listing. Degrades to an empty
    /// page when the store is unavailable.
    pub async fn list_posts(&self, query: &PostQuery) -> Vec<PostRecord> {
        let mut filters = Vec::new();
        if let Some(category) = &query.category {
            filters.push(Filter::eq("category", category.as_str()));
        }
        if let Some(subcategory) = &query.subcategory {
            filters.push(Filter::eq("subcategory", subcategory.as_str()));
        }
        if !query.tags.is_empty() {
            filters.push(Filter::array_contains_any("tags", query.tags.clone()));
        }
        if let Some(status) = query.status {
            filters.push(Filter::eq("status", status.as_str()));
        }
        if let Some(featured) = query.featured {
            filters.push(Filter::eq("featured", featured));
        }

        let order = OrderBy {
            field: query.order_field.clone(),
            direction: query.order_direction,
        };

        let documents = match self
            .store
            .query(collections::POSTS, &filters, Some(&order), None)
            .await
        {
            Ok(documents) => documents,
            Err(error) => {
                warn!(error = %error, "failed to list posts");
                return Vec::new();
            }
        };

        let posts = documents
            .iter()
            .filter_map(|document| match decode_post(document) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(id = %document.id, error = %error, "skipping undecodable post");
                    None
                }
            })
            .filter(|record| match &query.search {
                Some(term) => post_matches_search(record, term),
                None => true,
            });

        let skip = query.page.max(1).saturating_sub(1) * query.page_size;
        posts.skip(skip).take(query.page_size).collect()
    }

    /// Latest published posts. Degrades to an empty list.
    pub async fn recent_posts(&self, limit: usize) -> Vec<PostRecord> {
        let filters = [Filter::eq("status", PostStatus::Published.as_str())];
        let order = OrderBy::desc("publishDate");
        match self
            .store
            .query(collections::POSTS, &filters, Some(&order), Some(limit))
            .await
        {
            Ok(documents) => decode_many(&documents),
            Err(error) => {
                warn!(error = %error, "failed to fetch recent posts");
                Vec::new()
            }
        }
    }

    /// Featured published posts. Degrades to an empty list.
    pub async fn featured_posts(&self, limit: usize) -> Vec<PostRecord> {
        let filters = [
            Filter::eq("featured", true),
            Filter::eq("status", PostStatus::Published.as_str()),
        ];
        let order = OrderBy::desc("publishDate");
        match self
            .store
            .query(collections::POSTS, &filters, Some(&order), Some(limit))
            .await
        {
            Ok(documents) => decode_many(&documents),
            Err(error) => {
                warn!(error = %error, "failed to fetch featured posts");
                Vec::new()
            }
        }
    }

    /// Most-viewed published posts, falling back to recent posts when the
    /// view ordering yields nothing.
    pub async fn popular_posts(&self, limit: usize) -> Vec<PostRecord> {
        let order = OrderBy::desc("views");
        let by_views = match self
            .store
            .query(collections::POSTS, &[], Some(&order), Some(limit))
            .await
        {
            Ok(documents) => {
                let mut posts = decode_many(&documents);
                posts.retain(|record| record.status == PostStatus::Published);
                posts
            }
            Err(error) => {
                warn!(error = %error, "failed to fetch popular posts");
                Vec::new()
            }
        };

        if by_views.is_empty() {
            self.recent_posts(limit).await
        } else {
            by_views
        }
    }

    /// Backfill slugs for posts created before slugs existed. Returns the
    /// number of records updated; posts whose titles cannot produce a slug
    /// are skipped.
    pub async fn migrate_missing_slugs(&self) -> Result<usize, PostError> {
        let documents = self
            .store
            .query(collections::POSTS, &[], None, None)
            .await?;

        let mut migrated = 0usize;
        for document in &documents {
            let mut record = match decode_post(document) {
                Ok(record) => record,
                Err(error) => {
                    warn!(id = %document.id, error = %error, "skipping undecodable post");
                    continue;
                }
            };

            if record.slug.is_some() {
                continue;
            }

            let base = match derive_slug(&record.title) {
                Ok(base) => base,
                Err(error) => {
                    warn!(id = %record.id, error = %error, "cannot derive slug for post");
                    continue;
                }
            };

            record.slug = Some(self.ensure_unique_slug(&base, Some(&record.id)).await);
            let data = serde_json::to_value(&record).map_err(StoreError::from)?;
            self.store.update(collections::POSTS, &record.id, data).await?;
            migrated += 1;
        }

        Ok(migrated)
    }

    async fn fetch_raw(&self, id: &str) -> Result<PostRecord, PostError> {
        let document = self.store.get(collections::POSTS, id).await?;
        Ok(decode_post(&document)?)
    }

    async fn increment_views(&self, id: &str) {
        counter!("codetocrack_view_increment_total").increment(1);
        if let Err(error) = self
            .store
            .increment_field(collections::POSTS, id, "views", 1)
            .await
        {
            warn!(post = id, error = %error, "failed to increment view counter");
        }
    }
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), PostError> {
    if value.trim().is_empty() {
        Err(PostError::Validation(field))
    } else {
        Ok(())
    }
}

fn decode_post(document: &Document) -> Result<PostRecord, StoreError> {
    let mut record: PostRecord = document.decode()?;
    record.id = document.id.clone();
    Ok(record)
}

fn decode_many(documents: &[Document]) -> Vec<PostRecord> {
    documents
        .iter()
        .filter_map(|document| match decode_post(document) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(id = %document.id, error = %error, "skipping undecodable post");
                None
            }
        })
        .collect()
}

fn post_matches_search(post: &PostRecord, term: &str) -> bool {
    let term = term.to_lowercase();
    post.title.to_lowercase().contains(&term)
        || post.content.to_lowercase().contains(&term)
        || post.excerpt.to_lowercase().contains(&term)
        || post.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
}

fn strip_html(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;
    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text
}

/// Plain-text excerpt trimmed to `max_length` characters on a word boundary.
pub fn generate_excerpt(content: &str, max_length: usize) -> String {
    let text = strip_html(content);
    let text = text.trim();
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_length {
        return text.to_string();
    }

    let mut excerpt: String = chars[..max_length].iter().collect();
    if let Some(last_space) = excerpt.rfind(' ') {
        if last_space > 0 {
            excerpt.truncate(last_space);
        }
    }
    excerpt.push_str("...");
    excerpt
}

/// Estimated reading time in whole minutes, never below one.
pub fn calculate_read_time(content: &str) -> i64 {
    let words = strip_html(content).split_whitespace().count();
    (words.div_ceil(WORDS_PER_MINUTE)).max(1) as i64
}

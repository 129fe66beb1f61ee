//! Comment management: submission, moderation queue, approval.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::activity::ActivityService;
use crate::application::store::{Document, DocumentStore, Filter, OrderBy, StoreError, collections};
use crate::domain::entities::CommentRecord;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment not found")]
    NotFound,
    #[error("missing required field `{0}`")]
    Validation(&'static str),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CommentError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => CommentError::NotFound,
            other => CommentError::Store(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddCommentParams {
    pub post_id: String,
    pub author_name: String,
    pub author_email: String,
    pub author_website: Option<String>,
    pub content: String,
    pub parent_comment_id: Option<String>,
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn DocumentStore>,
    activity: ActivityService,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>, activity: ActivityService) -> Self {
        Self { store, activity }
    }

    /// Submit a comment. New comments await moderation.
    pub async fn add_comment(&self, params: AddCommentParams) -> Result<CommentRecord, CommentError> {
        if params.post_id.trim().is_empty() {
            return Err(CommentError::Validation("post_id"));
        }
        if params.author_name.trim().is_empty() {
            return Err(CommentError::Validation("author_name"));
        }
        if params.content.trim().is_empty() {
            return Err(CommentError::Validation("content"));
        }

        let mut record = CommentRecord {
            id: String::new(),
            post_id: params.post_id,
            author_name: params.author_name,
            author_email: params.author_email,
            author_website: params.author_website,
            content: params.content,
            parent_comment_id: params.parent_comment_id,
            approved: false,
            created_at: OffsetDateTime::now_utc(),
            approved_at: None,
        };

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        record.id = self.store.create(collections::COMMENTS, data).await?;

        self.activity
            .record(
                "comment_added",
                format!(
                    "New comment by {} on post ID {}",
                    record.author_name, record.post_id
                ),
                Some(&record.id),
            )
            .await;

        Ok(record)
    }

    /// Comments for a post, newest first; unapproved ones only when asked.
    /// Degrades to an empty list when the store is unavailable.
    pub async fn comments_for_post(
        &self,
        post_id: &str,
        include_unapproved: bool,
    ) -> Vec<CommentRecord> {
        let mut filters = vec![Filter::eq("postId", post_id)];
        if !include_unapproved {
            filters.push(Filter::eq("approved", true));
        }
        let order = OrderBy::desc("createdAt");

        match self
            .store
            .query(collections::COMMENTS, &filters, Some(&order), None)
            .await
        {
            Ok(documents) => decode_many(&documents),
            Err(error) => {
                warn!(post = post_id, error = %error, "failed to list comments");
                Vec::new()
            }
        }
    }

    /// Moderation queue, newest first. Degrades to an empty list.
    pub async fn pending_comments(&self) -> Vec<CommentRecord> {
        let filters = [Filter::eq("approved", false)];
        let order = OrderBy::desc("createdAt");

        match self
            .store
            .query(collections::COMMENTS, &filters, Some(&order), None)
            .await
        {
            Ok(documents) => decode_many(&documents),
            Err(error) => {
                warn!(error = %error, "failed to list pending comments");
                Vec::new()
            }
        }
    }

    pub async fn approve_comment(&self, id: &str) -> Result<(), CommentError> {
        let document = self.store.get(collections::COMMENTS, id).await?;
        let mut record = decode_comment(&document)?;
        record.approved = true;
        record.approved_at = Some(OffsetDateTime::now_utc());

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store.update(collections::COMMENTS, id, data).await?;

        self.activity
            .record(
                "comment_approved",
                format!("Comment ID {id} approved"),
                Some(id),
            )
            .await;

        Ok(())
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), CommentError> {
        self.store.delete(collections::COMMENTS, id).await?;

        self.activity
            .record(
                "comment_deleted",
                format!("Comment ID {id} deleted"),
                Some(id),
            )
            .await;

        Ok(())
    }
}

fn decode_comment(document: &Document) -> Result<CommentRecord, StoreError> {
    let mut record: CommentRecord = document.decode()?;
    record.id = document.id.clone();
    Ok(record)
}

fn decode_many(documents: &[Document]) -> Vec<CommentRecord> {
    documents
        .iter()
        .filter_map(|document| match decode_comment(document) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(id = %document.id, error = %error, "skipping undecodable comment");
                None
            }
        })
        .collect()
}

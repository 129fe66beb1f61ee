//! Best-effort activity trail for admin actions.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::warn;

use crate::application::store::{Document, DocumentStore, OrderBy, StoreError, collections};
use crate::domain::entities::ActivityRecord;

/// Thin wrapper around the activity collection. Recording never fails the
/// host operation; failures are logged and swallowed.
#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn DocumentStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, action: &str, description: impl Into<String>, related_id: Option<&str>) {
        let record = ActivityRecord {
            id: String::new(),
            action: action.to_string(),
            description: description.into(),
            related_id: related_id.map(str::to_string),
            timestamp: OffsetDateTime::now_utc(),
        };

        let data = match serde_json::to_value(&record) {
            Ok(data) => data,
            Err(error) => {
                warn!(action, error = %error, "failed to encode activity record");
                return;
            }
        };

        if let Err(error) = self.store.create(collections::ACTIVITY, data).await {
            warn!(action, error = %error, "failed to record activity");
        }
    }

    /// Most recent activity entries, newest first. Degrades to an empty list
    /// when the store is unavailable.
    pub async fn recent(&self, limit: usize) -> Vec<ActivityRecord> {
        let order = OrderBy::desc("timestamp");
        let documents = match self
            .store
            .query(collections::ACTIVITY, &[], Some(&order), Some(limit))
            .await
        {
            Ok(documents) => documents,
            Err(error) => {
                warn!(error = %error, "failed to list recent activity");
                return Vec::new();
            }
        };

        documents
            .into_iter()
            .filter_map(|document| match decode_activity(&document) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(id = %document.id, error = %error, "skipping undecodable activity record");
                    None
                }
            })
            .collect()
    }
}

fn decode_activity(document: &Document) -> Result<ActivityRecord, StoreError> {
    let mut record: ActivityRecord = document.decode()?;
    record.id = document.id.clone();
    Ok(record)
}

//! Newsletter subscription management.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::activity::ActivityService;
use crate::application::store::{Document, DocumentStore, Filter, OrderBy, StoreError, collections};
use crate::domain::entities::SubscriberRecord;
use crate::domain::types::SubscriptionStatus;

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("email already subscribed")]
    AlreadySubscribed,
    #[error("email not found in subscription list")]
    NotFound,
    #[error("missing required field `{0}`")]
    Validation(&'static str),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for NewsletterError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => NewsletterError::NotFound,
            other => NewsletterError::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct NewsletterService {
    store: Arc<dyn DocumentStore>,
    activity: ActivityService,
}

impl NewsletterService {
    pub fn new(store: Arc<dyn DocumentStore>, activity: ActivityService) -> Self {
        Self { store, activity }
    }

    pub async fn subscribe(&self, email: &str) -> Result<SubscriberRecord, NewsletterError> {
        if email.trim().is_empty() {
            return Err(NewsletterError::Validation("email"));
        }

        if self.find_by_email(email).await?.is_some() {
            return Err(NewsletterError::AlreadySubscribed);
        }

        let mut record = SubscriberRecord {
            id: String::new(),
            email: email.to_string(),
            status: SubscriptionStatus::Active,
            subscribed_at: OffsetDateTime::now_utc(),
            unsubscribed_at: None,
        };

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        record.id = self.store.create(collections::NEWSLETTER, data).await?;

        self.activity
            .record(
                "newsletter_subscription",
                format!("New subscription: {email}"),
                Some(&record.id),
            )
            .await;

        Ok(record)
    }

    /// Flip the subscription to unsubscribed; the record is kept.
    pub async fn unsubscribe(&self, email: &str) -> Result<(), NewsletterError> {
        let Some(mut record) = self.find_by_email(email).await? else {
            return Err(NewsletterError::NotFound);
        };

        record.status = SubscriptionStatus::Unsubscribed;
        record.unsubscribed_at = Some(OffsetDateTime::now_utc());

        let data = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store
            .update(collections::NEWSLETTER, &record.id, data)
            .await?;

        self.activity
            .record(
                "newsletter_unsubscription",
                format!("Unsubscribed: {email}"),
                Some(&record.id),
            )
            .await;

        Ok(())
    }

    /// Subscribers, newest first. Degrades to an empty list when the store
    /// is unavailable.
    pub async fn subscribers(&self, only_active: bool) -> Vec<SubscriberRecord> {
        let mut filters = Vec::new();
        if only_active {
            filters.push(Filter::eq("status", SubscriptionStatus::Active.as_str()));
        }
        let order = OrderBy::desc("subscribedAt");

        match self
            .store
            .query(collections::NEWSLETTER, &filters, Some(&order), None)
            .await
        {
            Ok(documents) => documents
                .iter()
                .filter_map(|document| match decode_subscriber(document) {
                    Ok(record) => Some(record),
                    Err(error) => {
                        warn!(id = %document.id, error = %error, "skipping undecodable subscriber");
                        None
                    }
                })
                .collect(),
            Err(error) => {
                warn!(error = %error, "failed to list subscribers");
                Vec::new()
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, NewsletterError> {
        let filters = [Filter::eq("email", email)];
        let documents = self
            .store
            .query(collections::NEWSLETTER, &filters, None, Some(1))
            .await?;

        match documents.first() {
            Some(document) => Ok(Some(decode_subscriber(document)?)),
            None => Ok(None),
        }
    }
}

fn decode_subscriber(document: &Document) -> Result<SubscriberRecord, StoreError> {
    let mut record: SubscriberRecord = document.decode()?;
    record.id = document.id.clone();
    Ok(record)
}

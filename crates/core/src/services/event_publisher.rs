//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time change events.
//! The actual implementation is provided by the API crate (SSE broadcast).

use async_trait::async_trait;
use gad_common::AppResult;
use gad_db::entities::notification;
use serde::Serialize;
use std::sync::Arc;

/// Collections that clients can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Events,
    Participants,
    Periods,
    News,
    Employees,
    Surveys,
}

impl Collection {
    pub const ALL: [Self; 6] = [
        Self::Events,
        Self::Participants,
        Self::Periods,
        Self::News,
        Self::Employees,
        Self::Surveys,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Participants => "participants",
            Self::Periods => "periods",
            Self::News => "news",
            Self::Employees => "employees",
            Self::Surveys => "surveys",
        }
    }

    /// Parse a collection from its path segment.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A change to a record in a collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    /// Record ID; `None` for bulk changes such as imports.
    pub id: Option<String>,
    pub body: serde_json::Value,
}

impl ChangeEvent {
    /// Change of a single record, carrying its serialized form.
    pub fn record<T: Serialize>(
        collection: Collection,
        kind: ChangeKind,
        id: &str,
        record: &T,
    ) -> Self {
        Self {
            collection,
            kind,
            id: Some(id.to_string()),
            body: serde_json::to_value(record).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Bulk change of a collection.
    #[must_use]
    pub const fn bulk(collection: Collection, kind: ChangeKind, body: serde_json::Value) -> Self {
        Self {
            collection,
            kind,
            id: None,
            body,
        }
    }
}

/// Trait for publishing real-time events.
///
/// This allows the core services to publish events
/// without directly depending on the transport.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a collection change.
    async fn publish_change(&self, event: ChangeEvent) -> AppResult<()>;

    /// Publish a notification to its recipient.
    async fn publish_notification(&self, notification: &notification::Model) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for testing or when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_change(&self, _event: ChangeEvent) -> AppResult<()> {
        Ok(())
    }

    async fn publish_notification(&self, _notification: &notification::Model) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

/// Publish a change, logging instead of failing when delivery breaks.
pub(crate) async fn publish(publisher: Option<&EventPublisherService>, event: ChangeEvent) {
    let Some(publisher) = publisher else { return };
    let collection = event.collection.as_str();
    if let Err(e) = publisher.publish_change(event).await {
        tracing::warn!(error = %e, collection, "Failed to publish change event");
    }
}

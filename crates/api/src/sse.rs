//! Server-Sent Events (SSE) for real-time updates.
//!
//! Every collection has its own broadcast channel carrying change events;
//! notifications go to per-user channels.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use gad_common::{AppError, AppResult};
use gad_core::{ChangeEvent, ChangeKind, Collection, EventPublisher};
use gad_db::entities::notification;
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::{extractors::AuthUser, middleware::AppState};

/// SSE event types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SseEvent {
    /// A record was created, updated or deleted.
    Change {
        collection: Collection,
        kind: ChangeKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        body: serde_json::Value,
    },
    /// New notification for the connected user.
    Notification {
        id: String,
        kind: String,
        title: String,
        message: String,
    },
    /// Connection established.
    Connected,
}

impl From<ChangeEvent> for SseEvent {
    fn from(event: ChangeEvent) -> Self {
        Self::Change {
            collection: event.collection,
            kind: event.kind,
            id: event.id,
            body: event.body,
        }
    }
}

/// SSE broadcast channels.
#[derive(Clone)]
pub struct SseBroadcaster {
    collections: Arc<HashMap<Collection, broadcast::Sender<SseEvent>>>,
    /// User-specific events (keyed by user ID).
    user_channels: Arc<RwLock<HashMap<String, broadcast::Sender<SseEvent>>>>,
}

impl SseBroadcaster {
    /// Create a new SSE broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let collections = Collection::ALL
            .iter()
            .map(|collection| (*collection, broadcast::channel(1000).0))
            .collect();

        Self {
            collections: Arc::new(collections),
            user_channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to a collection's change events.
    #[must_use]
    pub fn subscribe(&self, collection: Collection) -> Option<broadcast::Receiver<SseEvent>> {
        self.collections.get(&collection).map(broadcast::Sender::subscribe)
    }

    /// Get or create a user-specific channel.
    pub async fn user_channel(&self, user_id: &str) -> broadcast::Sender<SseEvent> {
        let mut channels = self.user_channels.write().await;

        if let Some(sender) = channels.get(user_id) {
            return sender.clone();
        }

        let (sender, _) = broadcast::channel(100);
        channels.insert(user_id.to_string(), sender.clone());
        sender
    }

    /// Broadcast a change event to its collection's subscribers.
    pub fn broadcast_change(&self, event: ChangeEvent) {
        if let Some(sender) = self.collections.get(&event.collection) {
            // No receivers is not an error
            let _ = sender.send(event.into());
        }
    }

    /// Broadcast an event to a specific user.
    pub async fn broadcast_to_user(&self, user_id: &str, event: SseEvent) {
        let channels = self.user_channels.read().await;
        if let Some(sender) = channels.get(user_id) {
            let _ = sender.send(event);
        }
    }

    /// Clean up inactive user channels.
    pub async fn cleanup(&self) {
        let mut channels = self.user_channels.write().await;
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for SseBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for SseBroadcaster {
    async fn publish_change(&self, event: ChangeEvent) -> AppResult<()> {
        self.broadcast_change(event);
        Ok(())
    }

    async fn publish_notification(&self, notification: &notification::Model) -> AppResult<()> {
        self.broadcast_to_user(
            &notification.user_id,
            SseEvent::Notification {
                id: notification.id.clone(),
                kind: notification.kind.as_str().to_string(),
                title: notification.title.clone(),
                message: notification.message.clone(),
            },
        )
        .await;
        Ok(())
    }
}

fn event_stream(
    rx: broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Lagged receivers skip missed events; clients refetch on the next change.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        result.ok().map(|event| {
            Ok(Event::default()
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().data("error")))
        })
    });

    let initial = stream::once(async {
        Ok(Event::default()
            .json_data(&SseEvent::Connected)
            .unwrap_or_else(|_| Event::default().data("connected")))
    });

    Sse::new(initial.chain(stream)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Change stream of one collection.
async fn collection_stream(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let collection = Collection::parse(&collection)
        .ok_or_else(|| AppError::NotFound(format!("Unknown stream: {collection}")))?;
    let rx = state
        .sse_broadcaster
        .subscribe(collection)
        .ok_or_else(|| AppError::NotFound(format!("Unknown stream: {}", collection.as_str())))?;

    Ok(event_stream(rx))
}

/// Notification stream of the caller.
async fn notification_stream(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let sender = state.sse_broadcaster.user_channel(&user.id).await;
    event_stream(sender.subscribe())
}

/// Create SSE router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(notification_stream))
        .route("/{collection}", get(collection_stream))
}

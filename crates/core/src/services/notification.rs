//! Notification service.

use crate::services::event_publisher::EventPublisherService;
use gad_common::{AppResult, IdGenerator};
use gad_db::{
    entities::notification::{self, NotificationKind},
    repositories::{NotificationRepository, UserRepository},
};
use sea_orm::Set;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self {
            notification_repo,
            user_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Create a notification for one user and push it to their stream.
    pub async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            kind: Set(kind),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.notification_repo.create(model).await?;

        if let Some(publisher) = &self.event_publisher {
            if let Err(e) = publisher.publish_notification(&created).await {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to publish notification");
            }
        }

        Ok(created)
    }

    /// Notify every administrator.
    pub async fn notify_admins(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> AppResult<usize> {
        let admins = self.user_repo.find_admins().await?;
        for admin in &admins {
            self.notify(&admin.id, kind, title, message).await?;
        }
        Ok(admins.len())
    }

    /// List a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(&self, user_id: &str, id: &str) -> AppResult<()> {
        self.notification_repo.mark_as_read(id, user_id).await
    }

    /// Mark every notification of a user as read.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: sea_orm::DatabaseConnection) -> NotificationService {
        let db = Arc::new(db);
        NotificationService::new(
            NotificationRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_notify() {
        let created = notification::Model {
            id: "n1".to_string(),
            user_id: "user1".to_string(),
            title: "Import finished".to_string(),
            message: "50 of 50 records imported".to_string(),
            kind: NotificationKind::ImportCompleted,
            is_read: false,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[created]])
            .into_connection();

        let result = service(db)
            .notify(
                "user1",
                NotificationKind::ImportCompleted,
                "Import finished",
                "50 of 50 records imported",
            )
            .await;

        assert_eq!(result.unwrap().user_id, "user1");
    }

    #[tokio::test]
    async fn test_notify_admins_without_admins() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<gad_db::entities::user::Model>::new()])
            .into_connection();

        let sent = service(db)
            .notify_admins(NotificationKind::RegistrationPending, "New signup", "maria")
            .await;

        assert_eq!(sent.ok(), Some(0));
    }
}

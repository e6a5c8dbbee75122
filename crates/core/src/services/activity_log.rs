//! Activity log service.

use gad_common::{AppResult, IdGenerator};
use gad_db::{
    entities::activity_log::{self, ActivityStatus},
    repositories::ActivityLogRepository,
};
use sea_orm::Set;

/// Audit trail of administrative actions.
#[derive(Clone)]
pub struct ActivityLogService {
    repo: ActivityLogRepository,
    id_gen: IdGenerator,
}

/// One entry to append.
#[derive(Debug, Clone)]
pub struct ActivityEntry<'a> {
    pub user_id: Option<&'a str>,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<&'a str>,
    pub details: Option<String>,
    pub status: ActivityStatus,
}

impl<'a> ActivityEntry<'a> {
    /// A successful action by `user_id`.
    #[must_use]
    pub const fn success(user_id: Option<&'a str>, action: &'a str, entity_type: &'a str) -> Self {
        Self {
            user_id,
            action,
            entity_type,
            entity_id: None,
            details: None,
            status: ActivityStatus::Success,
        }
    }

    #[must_use]
    pub fn entity(mut self, entity_id: &'a str) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn failed(mut self) -> Self {
        self.status = ActivityStatus::Failure;
        self
    }
}

impl ActivityLogService {
    /// Create a new activity log service.
    #[must_use]
    pub const fn new(repo: ActivityLogRepository) -> Self {
        Self {
            repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an entry. Write failures are logged, not returned.
    pub async fn record(&self, entry: ActivityEntry<'_>) {
        let model = activity_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(entry.user_id.map(String::from)),
            action: Set(entry.action.to_string()),
            entity_type: Set(entry.entity_type.to_string()),
            entity_id: Set(entry.entity_id.map(String::from)),
            details: Set(entry.details),
            status: Set(entry.status),
            created_at: Set(chrono::Utc::now().into()),
        };

        if let Err(e) = self.repo.create(model).await {
            tracing::warn!(error = %e, action = entry.action, "Failed to write activity log");
        }
    }

    /// List entries newest first.
    pub async fn list(
        &self,
        user_id: Option<&str>,
        entity_type: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<activity_log::Model>> {
        self.repo.find(user_id, entity_type, limit, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_entry_builder() {
        let entry = ActivityEntry::success(Some("admin1"), "event.create", "event")
            .entity("e1")
            .details("Orientation");
        assert_eq!(entry.entity_id, Some("e1"));
        assert_eq!(entry.status, ActivityStatus::Success);
        assert_eq!(entry.failed().status, ActivityStatus::Failure);
    }

    #[tokio::test]
    async fn test_record_swallows_errors() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("disk full".to_string())])
                .into_connection(),
        );

        let service = ActivityLogService::new(ActivityLogRepository::new(db));
        service
            .record(ActivityEntry::success(None, "period.archive", "academic_period"))
            .await;
    }
}

//! Activity log repository.

use std::sync::Arc;

use gad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{ActivityLog, activity_log};

/// Repository for the append-only activity log.
#[derive(Clone)]
pub struct ActivityLogRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityLogRepository {
    /// Create a new activity log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an entry.
    pub async fn create(&self, model: activity_log::ActiveModel) -> AppResult<activity_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List entries newest first, optionally for one user or entity type.
    pub async fn find(
        &self,
        user_id: Option<&str>,
        entity_type: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<activity_log::Model>> {
        let mut query = ActivityLog::find().order_by_desc(activity_log::Column::Id);

        if let Some(user_id) = user_id {
            query = query.filter(activity_log::Column::UserId.eq(user_id));
        }
        if let Some(entity_type) = entity_type {
            query = query.filter(activity_log::Column::EntityType.eq(entity_type));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::activity_log::ActivityStatus;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_recent() {
        let entry = activity_log::Model {
            id: "l1".to_string(),
            user_id: Some("admin1".to_string()),
            action: "import.student".to_string(),
            entity_type: "participant".to_string(),
            entity_id: None,
            details: Some("48 of 50 records imported".to_string()),
            status: ActivityStatus::Success,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry]])
                .into_connection(),
        );

        let repo = ActivityLogRepository::new(db);
        let entries = repo.find(Some("admin1"), None, 20, 0).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "import.student");
    }
}

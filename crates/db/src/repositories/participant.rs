//! Participant repository.

use std::sync::Arc;

use gad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Expr,
};

use crate::entities::{
    Participant,
    participant::{self, ParticipantType},
};

/// Filters for listing participants.
#[derive(Debug, Clone, Default)]
pub struct ParticipantFilter {
    /// Restrict to one event.
    pub event_id: Option<String>,
    /// Restrict to one academic period.
    pub academic_period_id: Option<String>,
    /// Restrict to one participant type.
    pub participant_type: Option<ParticipantType>,
    /// Include archived participants.
    pub include_archived: bool,
}

impl ParticipantFilter {
    fn apply(&self, mut query: Select<Participant>) -> Select<Participant> {
        if let Some(event_id) = &self.event_id {
            query = query.filter(participant::Column::EventId.eq(event_id.as_str()));
        }
        if let Some(period_id) = &self.academic_period_id {
            query = query.filter(participant::Column::AcademicPeriodId.eq(period_id.as_str()));
        }
        if let Some(kind) = self.participant_type {
            query = query.filter(participant::Column::ParticipantType.eq(kind));
        }
        if !self.include_archived {
            query = query.filter(participant::Column::IsArchived.eq(false));
        }
        query
    }
}

/// Repository for participant operations.
#[derive(Clone)]
pub struct ParticipantRepository {
    db: Arc<DatabaseConnection>,
}

impl ParticipantRepository {
    /// Create a new participant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a participant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<participant::Model>> {
        Participant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a participant by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<participant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant not found: {id}")))
    }

    /// Create a new participant.
    pub async fn create(&self, model: participant::ActiveModel) -> AppResult<participant::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert many participants in one statement.
    ///
    /// Either every row is written or none is.
    pub async fn insert_many(&self, models: Vec<participant::ActiveModel>) -> AppResult<u64> {
        if models.is_empty() {
            return Ok(0);
        }

        Participant::insert_many(models)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a participant.
    pub async fn update(&self, model: participant::ActiveModel) -> AppResult<participant::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a participant permanently.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let participant = self.get_by_id(id).await?;
        participant
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Mark a participant as archived.
    pub async fn archive(&self, id: &str) -> AppResult<u64> {
        let result = Participant::update_many()
            .col_expr(participant::Column::IsArchived, Expr::value(true))
            .filter(participant::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// List participants matching the filter, newest first.
    pub async fn find(
        &self,
        filter: &ParticipantFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<participant::Model>> {
        filter
            .apply(Participant::find())
            .order_by_desc(participant::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Load every participant matching the filter for aggregation.
    pub async fn find_all(&self, filter: &ParticipantFilter) -> AppResult<Vec<participant::Model>> {
        filter
            .apply(Participant::find())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count participants matching the filter.
    pub async fn count(&self, filter: &ParticipantFilter) -> AppResult<u64> {
        filter
            .apply(Participant::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_participant(id: &str, kind: ParticipantType) -> participant::Model {
        participant::Model {
            id: id.to_string(),
            participant_type: kind,
            name: "Juan Dela Cruz".to_string(),
            sex: Some("Male".to_string()),
            age: Some(20),
            address: Some("Valencia City, Bukidnon".to_string()),
            ethnic_group: Some("Higaonon".to_string()),
            other_ethnic_group: None,
            student_id: Some("2021-0001".to_string()),
            school: None,
            year_level: Some("3rd Year".to_string()),
            section: None,
            staff_id: None,
            department: None,
            organization: None,
            event_id: "e1".to_string(),
            academic_period_id: "p1".to_string(),
            is_archived: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_event() {
        let p1 = create_test_participant("a", ParticipantType::Student);
        let p2 = create_test_participant("b", ParticipantType::Student);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        let filter = ParticipantFilter {
            event_id: Some("e1".to_string()),
            participant_type: Some(ParticipantType::Student),
            ..Default::default()
        };
        let found = repo.find(&filter, 50, 0).await.unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.event_id == "e1"));
    }

    #[tokio::test]
    async fn test_insert_many_empty_is_noop() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ParticipantRepository::new(db);
        assert_eq!(repo.insert_many(Vec::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_many() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        let models = ["a", "b"]
            .into_iter()
            .map(|id| participant::ActiveModel {
                id: Set(id.to_string()),
                participant_type: Set(ParticipantType::Community),
                name: Set(format!("Participant {id}")),
                event_id: Set("e1".to_string()),
                academic_period_id: Set("p1".to_string()),
                ..Default::default()
            })
            .collect();

        assert_eq!(repo.insert_many(models).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<participant::Model>::new()])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        assert!(matches!(repo.delete("gone").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(42))
                }]])
                .into_connection(),
        );

        let repo = ParticipantRepository::new(db);
        let count = repo.count(&ParticipantFilter::default()).await.unwrap();

        assert_eq!(count, 42);
    }
}

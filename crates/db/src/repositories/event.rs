//! Event repository.

use std::sync::Arc;

use gad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Expr,
};

use crate::entities::{Event, event};

/// Filters for listing events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to one academic period.
    pub academic_period_id: Option<String>,
    /// Include archived events.
    pub include_archived: bool,
    /// Only events flagged for the homepage.
    pub homepage_only: bool,
    /// Substring match on name or venue.
    pub search: Option<String>,
}

impl EventFilter {
    fn apply(&self, mut query: Select<Event>) -> Select<Event> {
        if let Some(period_id) = &self.academic_period_id {
            query = query.filter(event::Column::AcademicPeriodId.eq(period_id.as_str()));
        }
        if !self.include_archived {
            query = query.filter(event::Column::IsArchived.eq(false));
        }
        if self.homepage_only {
            query = query.filter(event::Column::ShowOnHomepage.eq(true));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.replace('%', "\\%").replace('_', "\\_"));
            query = query.filter(
                Condition::any()
                    .add(event::Column::Name.like(&pattern))
                    .add(event::Column::Venue.like(&pattern)),
            );
        }
        query
    }
}

/// Repository for event operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event not found: {id}")))
    }

    /// Create a new event.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an event.
    pub async fn update(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List events matching the filter, latest date first.
    pub async fn find(
        &self,
        filter: &EventFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        filter
            .apply(Event::find())
            .order_by_desc(event::Column::Date)
            .order_by_desc(event::Column::StartTime)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count events matching the filter.
    pub async fn count(&self, filter: &EventFilter) -> AppResult<u64> {
        filter
            .apply(Event::find())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Soft-delete an event and its participants.
    pub async fn archive(&self, id: &str) -> AppResult<u64> {
        use crate::entities::{Participant, participant};

        let result = Event::update_many()
            .col_expr(event::Column::IsArchived, Expr::value(true))
            .filter(event::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Participant::update_many()
            .col_expr(participant::Column::IsArchived, Expr::value(true))
            .filter(participant::Column::EventId.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::event::EventType;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_event(id: &str, name: &str) -> event::Model {
        event::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            venue: "Gymnasium".to_string(),
            event_type: EventType::NonAcademic,
            category: "Women's Month".to_string(),
            duration_minutes: 210,
            created_by: "admin1".to_string(),
            academic_period_id: "p1".to_string(),
            is_archived: false,
            show_on_homepage: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let event = create_test_event("e1", "Gender Sensitivity Training");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[event]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let found = repo.find_by_id("e1").await.unwrap().unwrap();

        assert_eq!(found.name, "Gender Sensitivity Training");
        assert_eq!(found.duration_minutes, 210);
    }

    #[tokio::test]
    async fn test_find_with_filter() {
        let e1 = create_test_event("e1", "Orientation");
        let e2 = create_test_event("e2", "Seminar");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let filter = EventFilter {
            academic_period_id: Some("p1".to_string()),
            homepage_only: true,
            ..Default::default()
        };
        let events = repo.find(&filter, 20, 0).await.unwrap();

        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        assert_eq!(repo.count(&EventFilter::default()).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_archive() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 25,
                    },
                ])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        assert_eq!(repo.archive("e1").await.unwrap(), 1);
    }
}

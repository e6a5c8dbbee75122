//! Academic period repository.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use gad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, sea_query::Expr,
};

use crate::entities::{AcademicPeriod, Event, Participant, academic_period, event, participant};

/// Repository for academic period operations.
#[derive(Clone)]
pub struct AcademicPeriodRepository {
    db: Arc<DatabaseConnection>,
}

impl AcademicPeriodRepository {
    /// Create a new academic period repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a period by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<academic_period::Model>> {
        AcademicPeriod::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a period by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<academic_period::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Academic period not found: {id}")))
    }

    /// Find the currently active period, if any.
    pub async fn find_active(&self) -> AppResult<Option<academic_period::Model>> {
        AcademicPeriod::find()
            .filter(academic_period::Column::IsActive.eq(true))
            .filter(academic_period::Column::IsArchived.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The requested period, or the active one when none is requested.
    pub async fn resolve(
        &self,
        requested: Option<&str>,
    ) -> AppResult<Option<academic_period::Model>> {
        match requested {
            Some(id) => self.get_by_id(id).await.map(Some),
            None => self.find_active().await,
        }
    }

    /// List periods, most recent start date first.
    pub async fn find_all(&self, include_archived: bool) -> AppResult<Vec<academic_period::Model>> {
        let mut query = AcademicPeriod::find().order_by_desc(academic_period::Column::StartDate);

        if !include_archived {
            query = query.filter(academic_period::Column::IsArchived.eq(false));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new period.
    pub async fn create(
        &self,
        model: academic_period::ActiveModel,
    ) -> AppResult<academic_period::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a period.
    pub async fn update(
        &self,
        model: academic_period::ActiveModel,
    ) -> AppResult<academic_period::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Make `id` the only active period.
    pub async fn activate(&self, id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        AcademicPeriod::update_many()
            .col_expr(academic_period::Column::IsActive, Expr::value(false))
            .filter(academic_period::Column::Id.ne(id))
            .filter(academic_period::Column::IsActive.eq(true))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        AcademicPeriod::update_many()
            .col_expr(academic_period::Column::IsActive, Expr::value(true))
            .filter(academic_period::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find non-archived periods whose end date is before `today`.
    pub async fn find_expired(&self, today: NaiveDate) -> AppResult<Vec<academic_period::Model>> {
        AcademicPeriod::find()
            .filter(academic_period::Column::IsArchived.eq(false))
            .filter(academic_period::Column::EndDate.lt(today))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Archive and deactivate a period along with its events and participants.
    pub async fn archive(&self, id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        AcademicPeriod::update_many()
            .col_expr(academic_period::Column::IsArchived, Expr::value(true))
            .col_expr(academic_period::Column::IsActive, Expr::value(false))
            .col_expr(academic_period::Column::ArchivedAt, Expr::value(now))
            .filter(academic_period::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Event::update_many()
            .col_expr(event::Column::IsArchived, Expr::value(true))
            .filter(event::Column::AcademicPeriodId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Participant::update_many()
            .col_expr(participant::Column::IsArchived, Expr::value(true))
            .filter(participant::Column::AcademicPeriodId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

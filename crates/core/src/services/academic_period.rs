//! Academic period service.

use crate::services::{
    activity_log::{ActivityEntry, ActivityLogService},
    event_publisher::{ChangeEvent, ChangeKind, Collection, EventPublisherService, publish},
    notification::NotificationService,
};
use chrono::NaiveDate;
use gad_common::{AppError, AppResult, IdGenerator};
use gad_db::{
    entities::{
        academic_period::{self, PeriodType},
        notification::NotificationKind,
    },
    repositories::AcademicPeriodRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating a period.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodInput {
    #[validate(length(equal = 9))]
    pub school_year: String,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Input for updating a period.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePeriodInput {
    #[validate(length(equal = 9))]
    pub school_year: Option<String>,
    pub period_type: Option<PeriodType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Academic period service for business logic.
#[derive(Clone)]
pub struct AcademicPeriodService {
    period_repo: AcademicPeriodRepository,
    activity_log: ActivityLogService,
    notification_service: NotificationService,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl AcademicPeriodService {
    /// Create a new academic period service.
    #[must_use]
    pub const fn new(
        period_repo: AcademicPeriodRepository,
        activity_log: ActivityLogService,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            period_repo,
            activity_log,
            notification_service,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Create a period. New periods start inactive.
    pub async fn create(
        &self,
        actor_id: &str,
        input: CreatePeriodInput,
    ) -> AppResult<academic_period::Model> {
        input.validate()?;
        validate_school_year(&input.school_year)?;
        validate_range(input.start_date, input.end_date)?;

        let model = academic_period::ActiveModel {
            id: Set(self.id_gen.generate()),
            school_year: Set(input.school_year),
            period_type: Set(input.period_type),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_active: Set(false),
            is_archived: Set(false),
            archived_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };

        let period = self.period_repo.create(model).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "period.create", "academic_period")
                    .entity(&period.id),
            )
            .await;
        self.publish(ChangeKind::Created, &period).await;

        Ok(period)
    }

    /// Get a period by ID.
    pub async fn get(&self, id: &str) -> AppResult<academic_period::Model> {
        self.period_repo.get_by_id(id).await
    }

    /// The active period, if any.
    pub async fn get_active(&self) -> AppResult<Option<academic_period::Model>> {
        self.period_repo.find_active().await
    }

    /// List periods, newest first.
    pub async fn list(&self, include_archived: bool) -> AppResult<Vec<academic_period::Model>> {
        self.period_repo.find_all(include_archived).await
    }

    /// Update a period's fields.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdatePeriodInput,
    ) -> AppResult<academic_period::Model> {
        input.validate()?;
        let period = self.period_repo.get_by_id(id).await?;

        if period.is_archived {
            return Err(AppError::BadRequest(
                "Archived periods cannot be modified".to_string(),
            ));
        }

        if let Some(school_year) = &input.school_year {
            validate_school_year(school_year)?;
        }
        let start = input.start_date.unwrap_or(period.start_date);
        let end = input.end_date.unwrap_or(period.end_date);
        validate_range(start, end)?;

        let mut active: academic_period::ActiveModel = period.into();
        if let Some(school_year) = input.school_year {
            active.school_year = Set(school_year);
        }
        if let Some(period_type) = input.period_type {
            active.period_type = Set(period_type);
        }
        active.start_date = Set(start);
        active.end_date = Set(end);

        let period = self.period_repo.update(active).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "period.update", "academic_period")
                    .entity(&period.id),
            )
            .await;
        self.publish(ChangeKind::Updated, &period).await;

        Ok(period)
    }

    /// Make a period the single active one.
    pub async fn activate(&self, actor_id: &str, id: &str) -> AppResult<academic_period::Model> {
        let period = self.period_repo.get_by_id(id).await?;

        if period.is_archived {
            return Err(AppError::BadRequest(
                "Archived periods cannot be activated".to_string(),
            ));
        }

        self.period_repo.activate(id).await?;
        let period = self.period_repo.get_by_id(id).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "period.activate", "academic_period")
                    .entity(&period.id),
            )
            .await;
        self.publish(ChangeKind::Updated, &period).await;

        tracing::info!(period_id = %period.id, school_year = %period.school_year, "Activated academic period");
        Ok(period)
    }

    /// Archive a period together with its events and participants.
    pub async fn archive(&self, actor_id: Option<&str>, id: &str) -> AppResult<academic_period::Model> {
        let period = self.period_repo.get_by_id(id).await?;

        if period.is_archived {
            return Ok(period);
        }

        self.period_repo.archive(id).await?;
        let period = self.period_repo.get_by_id(id).await?;

        self.activity_log
            .record(
                ActivityEntry::success(actor_id, "period.archive", "academic_period")
                    .entity(&period.id),
            )
            .await;
        self.publish(ChangeKind::Updated, &period).await;
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::bulk(
                Collection::Events,
                ChangeKind::Updated,
                serde_json::json!({ "academicPeriodId": period.id }),
            ),
        )
        .await;

        tracing::info!(period_id = %period.id, "Archived academic period");
        Ok(period)
    }

    /// Archive every non-archived period whose end date is before `today`.
    /// A period that fails to archive is logged and skipped; the count
    /// covers the periods actually archived.
    pub async fn archive_expired(&self, today: NaiveDate) -> AppResult<usize> {
        let expired = self.period_repo.find_expired(today).await?;
        let mut archived = 0;

        for period in expired {
            let period = match self.archive(None, &period.id).await {
                Ok(period) => period,
                Err(e) => {
                    tracing::error!(error = %e, period_id = %period.id, "Failed to archive expired period");
                    continue;
                }
            };
            archived += 1;

            if let Err(e) = self
                .notification_service
                .notify_admins(
                    NotificationKind::PeriodArchived,
                    "Academic period archived",
                    &format!(
                        "{} {} ended on {} and has been archived.",
                        period.school_year,
                        period_type_label(period.period_type),
                        period.end_date
                    ),
                )
                .await
            {
                tracing::warn!(error = %e, period_id = %period.id, "Failed to notify administrators of archival");
            }
        }

        Ok(archived)
    }

    async fn publish(&self, kind: ChangeKind, period: &academic_period::Model) {
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::record(Collection::Periods, kind, &period.id, period),
        )
        .await;
    }
}

/// Human-readable period type.
#[must_use]
pub const fn period_type_label(period_type: PeriodType) -> &'static str {
    match period_type {
        PeriodType::FirstSemester => "First Semester",
        PeriodType::SecondSemester => "Second Semester",
        PeriodType::Summer => "Summer",
    }
}

/// School years are written `YYYY-YYYY` with consecutive years.
fn validate_school_year(school_year: &str) -> AppResult<()> {
    let invalid = || {
        AppError::Validation(format!(
            "school year must look like 2024-2025, got {school_year:?}"
        ))
    };

    let (first, second) = school_year.split_once('-').ok_or_else(invalid)?;
    if first.len() != 4 || second.len() != 4 {
        return Err(invalid());
    }
    let first: u32 = first.parse().map_err(|_| invalid())?;
    let second: u32 = second.parse().map_err(|_| invalid())?;

    if second == first + 1 {
        Ok(())
    } else {
        Err(invalid())
    }
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start < end {
        Ok(())
    } else {
        Err(AppError::Validation(
            "start date must be before end date".to_string(),
        ))
    }
}

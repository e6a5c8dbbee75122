//! Event service.

use crate::services::{
    activity_log::{ActivityEntry, ActivityLogService},
    event_publisher::{ChangeEvent, ChangeKind, Collection, EventPublisherService, publish},
};
use chrono::{NaiveDate, NaiveTime};
use gad_common::{AppError, AppResult, IdGenerator};
use gad_db::{
    entities::event::{self, EventType},
    repositories::{AcademicPeriodRepository, EventFilter, EventRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating an event.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(min = 1, max = 256))]
    pub venue: String,
    pub event_type: EventType,
    #[validate(length(min = 1, max = 128))]
    pub category: String,
    /// Defaults to the active period.
    pub academic_period_id: Option<String>,
    #[serde(default)]
    pub show_on_homepage: bool,
}

/// Input for updating an event.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[validate(length(min = 1, max = 256))]
    pub venue: Option<String>,
    pub event_type: Option<EventType>,
    #[validate(length(min = 1, max = 128))]
    pub category: Option<String>,
    pub show_on_homepage: Option<bool>,
}

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    period_repo: AcademicPeriodRepository,
    activity_log: ActivityLogService,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(
        event_repo: EventRepository,
        period_repo: AcademicPeriodRepository,
        activity_log: ActivityLogService,
    ) -> Self {
        Self {
            event_repo,
            period_repo,
            activity_log,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Create an event in the given or the active academic period.
    pub async fn create(&self, creator_id: &str, input: CreateEventInput) -> AppResult<event::Model> {
        input.validate()?;
        let duration = compute_duration(input.start_time, input.end_time)?;

        let period = self
            .period_repo
            .resolve(input.academic_period_id.as_deref())
            .await?
            .ok_or_else(|| AppError::BadRequest("No active academic period".to_string()))?;

        if period.is_archived {
            return Err(AppError::BadRequest(
                "Events cannot be added to an archived period".to_string(),
            ));
        }

        let model = event::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            date: Set(input.date),
            start_time: Set(input.start_time),
            end_time: Set(input.end_time),
            venue: Set(input.venue.trim().to_string()),
            event_type: Set(input.event_type),
            category: Set(input.category.trim().to_string()),
            duration_minutes: Set(duration),
            created_by: Set(creator_id.to_string()),
            academic_period_id: Set(period.id),
            is_archived: Set(false),
            show_on_homepage: Set(input.show_on_homepage),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let event = self.event_repo.create(model).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(creator_id), "event.create", "event")
                    .entity(&event.id)
                    .details(event.name.clone()),
            )
            .await;
        self.publish(ChangeKind::Created, &event).await;

        Ok(event)
    }

    /// Get an event by ID.
    pub async fn get(&self, id: &str) -> AppResult<event::Model> {
        self.event_repo.get_by_id(id).await
    }

    /// List events with their total count.
    pub async fn list(
        &self,
        filter: &EventFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<event::Model>, u64)> {
        let events = self.event_repo.find(filter, limit, offset).await?;
        let total = self.event_repo.count(filter).await?;
        Ok((events, total))
    }

    /// Events flagged for the public homepage.
    pub async fn homepage(&self, limit: u64) -> AppResult<Vec<event::Model>> {
        let filter = EventFilter {
            homepage_only: true,
            ..EventFilter::default()
        };
        self.event_repo.find(&filter, limit, 0).await
    }

    /// Update an event. The duration follows the merged start and end times.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        input: UpdateEventInput,
    ) -> AppResult<event::Model> {
        input.validate()?;
        let event = self.event_repo.get_by_id(id).await?;

        if event.is_archived {
            return Err(AppError::BadRequest(
                "Archived events cannot be modified".to_string(),
            ));
        }

        let start = input.start_time.unwrap_or(event.start_time);
        let end = input.end_time.unwrap_or(event.end_time);
        let duration = compute_duration(start, end)?;

        let mut active: event::ActiveModel = event.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description).filter(|d| !d.is_empty()));
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(venue) = input.venue {
            active.venue = Set(venue.trim().to_string());
        }
        if let Some(event_type) = input.event_type {
            active.event_type = Set(event_type);
        }
        if let Some(category) = input.category {
            active.category = Set(category.trim().to_string());
        }
        if let Some(show) = input.show_on_homepage {
            active.show_on_homepage = Set(show);
        }
        active.start_time = Set(start);
        active.end_time = Set(end);
        active.duration_minutes = Set(duration);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let event = self.event_repo.update(active).await?;

        self.activity_log
            .record(ActivityEntry::success(Some(actor_id), "event.update", "event").entity(&event.id))
            .await;
        self.publish(ChangeKind::Updated, &event).await;

        Ok(event)
    }

    /// Toggle homepage visibility.
    pub async fn set_homepage(
        &self,
        actor_id: &str,
        id: &str,
        show: bool,
    ) -> AppResult<event::Model> {
        self.update(
            actor_id,
            id,
            UpdateEventInput {
                show_on_homepage: Some(show),
                ..UpdateEventInput::default()
            },
        )
        .await
    }

    /// Archive an event and its participants. Events are never hard-deleted.
    pub async fn archive(&self, actor_id: &str, id: &str) -> AppResult<()> {
        let event = self.event_repo.get_by_id(id).await?;
        if event.is_archived {
            return Ok(());
        }

        self.event_repo.archive(id).await?;
        tracing::info!(event_id = %id, "Archived event");

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "event.archive", "event")
                    .entity(id)
                    .details(event.name.clone()),
            )
            .await;
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::record(Collection::Events, ChangeKind::Deleted, id, &event),
        )
        .await;
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::bulk(
                Collection::Participants,
                ChangeKind::Updated,
                serde_json::json!({ "eventId": id }),
            ),
        )
        .await;

        Ok(())
    }

    async fn publish(&self, kind: ChangeKind, event: &event::Model) {
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::record(Collection::Events, kind, &event.id, event),
        )
        .await;
    }
}

/// Minutes between start and end. The end must come after the start.
pub fn compute_duration(start: NaiveTime, end: NaiveTime) -> AppResult<i32> {
    if end <= start {
        return Err(AppError::Validation(
            "end time must be after start time".to_string(),
        ));
    }

    i32::try_from((end - start).num_minutes())
        .map_err(|_| AppError::Validation("event is too long".to_string()))
}

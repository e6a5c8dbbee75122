//! Participant service.

use crate::services::{
    activity_log::{ActivityEntry, ActivityLogService},
    event_publisher::{ChangeEvent, ChangeKind, Collection, EventPublisherService, publish},
};
use gad_common::{AppError, AppResult, IdGenerator};
use gad_db::{
    entities::participant::{self, ParticipantType},
    repositories::{EventRepository, ParticipantFilter, ParticipantRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Fields that must be present for each participant type.
#[must_use]
pub const fn required_fields(kind: ParticipantType) -> &'static [&'static str] {
    match kind {
        ParticipantType::Student => &["name", "student_id", "sex"],
        ParticipantType::Staff => &["name", "staff_id", "sex"],
        ParticipantType::Community => &["name", "sex"],
    }
}

/// Descriptive participant fields shared by manual entry and import.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetails {
    pub participant_type: Option<ParticipantType>,
    #[validate(length(max = 256))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub sex: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    #[validate(length(max = 1024))]
    pub address: Option<String>,
    #[validate(length(max = 128))]
    pub ethnic_group: Option<String>,
    #[validate(length(max = 128))]
    pub other_ethnic_group: Option<String>,
    #[validate(length(max = 64))]
    pub student_id: Option<String>,
    #[validate(length(max = 256))]
    pub school: Option<String>,
    #[validate(length(max = 64))]
    pub year_level: Option<String>,
    #[validate(length(max = 64))]
    pub section: Option<String>,
    #[validate(length(max = 64))]
    pub staff_id: Option<String>,
    #[validate(length(max = 256))]
    pub department: Option<String>,
    #[validate(length(max = 256))]
    pub organization: Option<String>,
}

impl ParticipantDetails {
    /// Trim every text field and drop the empty ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            participant_type: self.participant_type,
            name: clean(self.name),
            sex: clean(self.sex),
            age: self.age,
            address: clean(self.address),
            ethnic_group: clean(self.ethnic_group),
            other_ethnic_group: clean(self.other_ethnic_group),
            student_id: clean(self.student_id),
            school: clean(self.school),
            year_level: clean(self.year_level),
            section: clean(self.section),
            staff_id: clean(self.staff_id),
            department: clean(self.department),
            organization: clean(self.organization),
        }
    }

    /// First required field that is absent for `kind`.
    #[must_use]
    pub fn missing_field(&self, kind: ParticipantType) -> Option<&'static str> {
        required_fields(kind).iter().copied().find(|field| {
            let value = match *field {
                "name" => self.name.as_deref(),
                "sex" => self.sex.as_deref(),
                "student_id" => self.student_id.as_deref(),
                "staff_id" => self.staff_id.as_deref(),
                _ => None,
            };
            value.is_none_or(|v| v.trim().is_empty())
        })
    }

    /// Identifier used in import error reports.
    #[must_use]
    pub fn identifier(&self) -> Option<String> {
        self.student_id
            .clone()
            .or_else(|| self.staff_id.clone())
            .or_else(|| self.name.clone())
    }

    /// Validate and build a new row.
    pub fn into_active_model(
        self,
        id: String,
        kind: ParticipantType,
        event_id: &str,
        academic_period_id: &str,
    ) -> AppResult<participant::ActiveModel> {
        let details = self.normalized();
        if let Some(field) = details.missing_field(kind) {
            return Err(AppError::Validation(format!(
                "missing required field: {field}"
            )));
        }

        Ok(participant::ActiveModel {
            id: Set(id),
            participant_type: Set(kind),
            name: Set(details.name.unwrap_or_default()),
            sex: Set(details.sex),
            age: Set(details.age),
            address: Set(details.address),
            ethnic_group: Set(details.ethnic_group),
            other_ethnic_group: Set(details.other_ethnic_group),
            student_id: Set(details.student_id),
            school: Set(details.school),
            year_level: Set(details.year_level),
            section: Set(details.section),
            staff_id: Set(details.staff_id),
            department: Set(details.department),
            organization: Set(details.organization),
            event_id: Set(event_id.to_string()),
            academic_period_id: Set(academic_period_id.to_string()),
            is_archived: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        })
    }
}

/// Input for registering a participant to an event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParticipantInput {
    pub event_id: String,
    #[serde(flatten)]
    pub details: ParticipantDetails,
}

/// Participant service for business logic.
#[derive(Clone)]
pub struct ParticipantService {
    participant_repo: ParticipantRepository,
    event_repo: EventRepository,
    activity_log: ActivityLogService,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl ParticipantService {
    /// Create a new participant service.
    #[must_use]
    pub const fn new(
        participant_repo: ParticipantRepository,
        event_repo: EventRepository,
        activity_log: ActivityLogService,
    ) -> Self {
        Self {
            participant_repo,
            event_repo,
            activity_log,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Register a participant. The academic period is taken from the event.
    pub async fn create(
        &self,
        actor_id: &str,
        input: CreateParticipantInput,
    ) -> AppResult<participant::Model> {
        input.details.validate()?;
        let kind = input
            .details
            .participant_type
            .ok_or_else(|| AppError::Validation("missing required field: participant_type".to_string()))?;

        let event = self.event_repo.get_by_id(&input.event_id).await?;
        if event.is_archived {
            return Err(AppError::BadRequest(
                "Participants cannot be added to an archived event".to_string(),
            ));
        }

        let model = input.details.into_active_model(
            self.id_gen.generate(),
            kind,
            &event.id,
            &event.academic_period_id,
        )?;
        let participant = self.participant_repo.create(model).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "participant.create", "participant")
                    .entity(&participant.id),
            )
            .await;
        self.publish(ChangeKind::Created, &participant).await;

        Ok(participant)
    }

    /// Get a participant by ID.
    pub async fn get(&self, id: &str) -> AppResult<participant::Model> {
        self.participant_repo.get_by_id(id).await
    }

    /// List participants with their total count.
    pub async fn list(
        &self,
        filter: &ParticipantFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<participant::Model>, u64)> {
        let participants = self.participant_repo.find(filter, limit, offset).await?;
        let total = self.participant_repo.count(filter).await?;
        Ok((participants, total))
    }

    /// Replace a participant's descriptive fields.
    pub async fn update(
        &self,
        actor_id: &str,
        id: &str,
        details: ParticipantDetails,
    ) -> AppResult<participant::Model> {
        details.validate()?;
        let existing = self.participant_repo.get_by_id(id).await?;
        let kind = details.participant_type.unwrap_or(existing.participant_type);

        let model = details.into_active_model(
            existing.id.clone(),
            kind,
            &existing.event_id,
            &existing.academic_period_id,
        )?;
        let mut active: participant::ActiveModel = existing.into();
        active.participant_type = model.participant_type;
        active.name = model.name;
        active.sex = model.sex;
        active.age = model.age;
        active.address = model.address;
        active.ethnic_group = model.ethnic_group;
        active.other_ethnic_group = model.other_ethnic_group;
        active.student_id = model.student_id;
        active.school = model.school;
        active.year_level = model.year_level;
        active.section = model.section;
        active.staff_id = model.staff_id;
        active.department = model.department;
        active.organization = model.organization;

        let participant = self.participant_repo.update(active).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "participant.update", "participant")
                    .entity(&participant.id),
            )
            .await;
        self.publish(ChangeKind::Updated, &participant).await;

        Ok(participant)
    }

    /// Permanently delete a participant.
    pub async fn delete(&self, actor_id: &str, id: &str) -> AppResult<()> {
        self.participant_repo.delete(id).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "participant.delete", "participant")
                    .entity(id),
            )
            .await;
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent {
                collection: Collection::Participants,
                kind: ChangeKind::Deleted,
                id: Some(id.to_string()),
                body: serde_json::Value::Null,
            },
        )
        .await;

        Ok(())
    }

    /// Archive a participant.
    pub async fn archive(&self, actor_id: &str, id: &str) -> AppResult<participant::Model> {
        self.participant_repo.get_by_id(id).await?;
        self.participant_repo.archive(id).await?;
        let participant = self.participant_repo.get_by_id(id).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "participant.archive", "participant")
                    .entity(id),
            )
            .await;
        self.publish(ChangeKind::Updated, &participant).await;

        Ok(participant)
    }

    async fn publish(&self, kind: ChangeKind, participant: &participant::Model) {
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::record(Collection::Participants, kind, &participant.id, participant),
        )
        .await;
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use gad_db::{
        entities::event::{self, EventType},
        repositories::ActivityLogRepository,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> ParticipantService {
        let db = Arc::new(db);
        ParticipantService::new(
            ParticipantRepository::new(Arc::clone(&db)),
            EventRepository::new(Arc::clone(&db)),
            ActivityLogService::new(ActivityLogRepository::new(db)),
        )
    }

    fn create_test_event(is_archived: bool) -> event::Model {
        event::Model {
            id: "event1".to_string(),
            name: "Gender Sensitivity Seminar".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            venue: "AVR".to_string(),
            event_type: EventType::Academic,
            category: "Seminar".to_string(),
            duration_minutes: 240,
            created_by: "admin1".to_string(),
            academic_period_id: "period1".to_string(),
            is_archived,
            show_on_homepage: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn student_details() -> ParticipantDetails {
        ParticipantDetails {
            participant_type: Some(ParticipantType::Student),
            name: Some("Juan Dela Cruz".to_string()),
            sex: Some("Male".to_string()),
            student_id: Some("2021-00123".to_string()),
            ..ParticipantDetails::default()
        }
    }

    #[test]
    fn test_missing_field_per_type() {
        let details = student_details();
        assert_eq!(details.missing_field(ParticipantType::Student), None);
        assert_eq!(
            details.missing_field(ParticipantType::Staff),
            Some("staff_id")
        );
        assert_eq!(details.missing_field(ParticipantType::Community), None);

        let blank_name = ParticipantDetails {
            name: Some("   ".to_string()),
            ..student_details()
        };
        assert_eq!(
            blank_name.missing_field(ParticipantType::Student),
            Some("name")
        );
    }

    #[test]
    fn test_into_active_model_reports_missing_field() {
        let details = ParticipantDetails {
            sex: None,
            ..student_details()
        };
        let err = details
            .into_active_model("p1".to_string(), ParticipantType::Student, "e1", "p1")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: missing required field: sex"
        );
    }

    #[test]
    fn test_normalized_drops_blank_fields() {
        let details = ParticipantDetails {
            address: Some("  ".to_string()),
            school: Some(" CMU ".to_string()),
            ..student_details()
        }
        .normalized();
        assert_eq!(details.address, None);
        assert_eq!(details.school.as_deref(), Some("CMU"));
    }

    #[test]
    fn test_identifier_prefers_ids() {
        assert_eq!(student_details().identifier().as_deref(), Some("2021-00123"));
        let community = ParticipantDetails {
            name: Some("Ana".to_string()),
            ..ParticipantDetails::default()
        };
        assert_eq!(community.identifier().as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_create_for_archived_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_event(true)]])
            .into_connection();

        let result = service(db)
            .create(
                "admin1",
                CreateParticipantInput {
                    event_id: "event1".to_string(),
                    details: student_details(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_requires_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let result = service(db)
            .create(
                "admin1",
                CreateParticipantInput {
                    event_id: "event1".to_string(),
                    details: ParticipantDetails {
                        participant_type: None,
                        ..student_details()
                    },
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

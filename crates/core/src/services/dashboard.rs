//! Dashboard counts and demographic analytics.

use gad_common::{AppError, AppResult};
use gad_db::{
    entities::{academic_period, user::ApprovalStatus},
    repositories::{
        AcademicPeriodRepository, EmployeeRepository, EventFilter, EventRepository,
        NotificationRepository, ParticipantFilter, ParticipantRepository, UserRepository,
    },
};
use serde::Serialize;

use crate::{
    demographics::{
        DemographicBucket, DemographicSummary, education_breakdown, participant_type_breakdown,
        summarize,
    },
    gazetteer::{Gazetteer, LocationNode, default_gazetteer},
};

/// Headline counts for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_period: Option<academic_period::Model>,
    pub events: u64,
    pub participants: u64,
    pub employees: u64,
    pub surveys: u64,
    /// Only counted for administrators.
    pub pending_users: u64,
    pub unread_notifications: u64,
}

/// Participant demographics for a period or a single event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAnalytics {
    pub academic_period_id: Option<String>,
    pub event_id: Option<String>,
    #[serde(flatten)]
    pub demographics: DemographicSummary,
    pub by_participant_type: Vec<DemographicBucket>,
    pub locations: LocationNode,
}

/// Employee demographics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAnalytics {
    #[serde(flatten)]
    pub demographics: DemographicSummary,
    pub by_education: Vec<DemographicBucket>,
    pub locations: LocationNode,
}

/// Dashboard service for business logic.
#[derive(Clone)]
pub struct DashboardService {
    period_repo: AcademicPeriodRepository,
    event_repo: EventRepository,
    participant_repo: ParticipantRepository,
    employee_repo: EmployeeRepository,
    user_repo: UserRepository,
    notification_repo: NotificationRepository,
    gazetteer: &'static Gazetteer,
}

impl DashboardService {
    /// Create a new dashboard service using the built-in gazetteer.
    #[must_use]
    pub fn new(
        period_repo: AcademicPeriodRepository,
        event_repo: EventRepository,
        participant_repo: ParticipantRepository,
        employee_repo: EmployeeRepository,
        user_repo: UserRepository,
        notification_repo: NotificationRepository,
    ) -> Self {
        Self {
            period_repo,
            event_repo,
            participant_repo,
            employee_repo,
            user_repo,
            notification_repo,
            gazetteer: default_gazetteer(),
        }
    }

    /// Headline counts. Period-scoped counts are zero without an active period.
    pub async fn summary(&self, user_id: &str, is_admin: bool) -> AppResult<DashboardSummary> {
        let active_period = self.period_repo.find_active().await?;

        let Some(period) = active_period else {
            let (employees, surveys, pending_users, unread_notifications) = tokio::try_join!(
                self.employee_repo.count(),
                self.employee_repo.count_surveys(None),
                self.pending_users(is_admin),
                self.notification_repo.count_unread(user_id),
            )?;
            return Ok(DashboardSummary {
                active_period: None,
                events: 0,
                participants: 0,
                employees,
                surveys,
                pending_users,
                unread_notifications,
            });
        };

        let event_filter = EventFilter {
            academic_period_id: Some(period.id.clone()),
            ..EventFilter::default()
        };
        let participant_filter = ParticipantFilter {
            academic_period_id: Some(period.id.clone()),
            ..ParticipantFilter::default()
        };

        let (events, participants, employees, surveys, pending_users, unread_notifications) = tokio::try_join!(
            self.event_repo.count(&event_filter),
            self.participant_repo.count(&participant_filter),
            self.employee_repo.count(),
            self.employee_repo.count_surveys(None),
            self.pending_users(is_admin),
            self.notification_repo.count_unread(user_id),
        )?;

        Ok(DashboardSummary {
            active_period: Some(period),
            events,
            participants,
            employees,
            surveys,
            pending_users,
            unread_notifications,
        })
    }

    async fn pending_users(&self, is_admin: bool) -> AppResult<u64> {
        if is_admin {
            self.user_repo.count_by_status(ApprovalStatus::Pending).await
        } else {
            Ok(0)
        }
    }

    /// Participant demographics. An event scope takes precedence over a
    /// period scope; with neither, the active period is used.
    pub async fn participant_analytics(
        &self,
        academic_period_id: Option<String>,
        event_id: Option<String>,
    ) -> AppResult<ParticipantAnalytics> {
        let filter = if let Some(event_id) = event_id {
            let event = self.event_repo.get_by_id(&event_id).await?;
            ParticipantFilter {
                event_id: Some(event.id),
                academic_period_id: Some(event.academic_period_id),
                include_archived: event.is_archived,
                ..ParticipantFilter::default()
            }
        } else {
            let period = match academic_period_id {
                Some(id) => self.period_repo.get_by_id(&id).await?,
                None => self.period_repo.find_active().await?.ok_or_else(|| {
                    AppError::BadRequest("No active academic period".to_string())
                })?,
            };
            ParticipantFilter {
                include_archived: period.is_archived,
                academic_period_id: Some(period.id),
                ..ParticipantFilter::default()
            }
        };

        let participants = self.participant_repo.find_all(&filter).await?;
        tracing::debug!(count = participants.len(), "Aggregating participant demographics");

        Ok(ParticipantAnalytics {
            demographics: summarize(&participants, self.gazetteer),
            by_participant_type: participant_type_breakdown(&participants),
            locations: self
                .gazetteer
                .sunburst(participants.iter().map(|p| p.address.as_deref())),
            academic_period_id: filter.academic_period_id,
            event_id: filter.event_id,
        })
    }

    /// Employee demographics over every employee record.
    pub async fn employee_analytics(&self) -> AppResult<EmployeeAnalytics> {
        let employees = self.employee_repo.find_everyone().await?;

        Ok(EmployeeAnalytics {
            demographics: summarize(&employees, self.gazetteer),
            by_education: education_breakdown(&employees),
            locations: self
                .gazetteer
                .sunburst(employees.iter().map(|e| e.address.as_deref())),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gad_db::entities::{
        employee,
        participant::{self, ParticipantType},
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> DashboardService {
        let db = Arc::new(db);
        DashboardService::new(
            AcademicPeriodRepository::new(Arc::clone(&db)),
            EventRepository::new(Arc::clone(&db)),
            ParticipantRepository::new(Arc::clone(&db)),
            EmployeeRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            NotificationRepository::new(db),
        )
    }

    fn count(n: i64) -> Vec<std::collections::BTreeMap<&'static str, Value>> {
        vec![maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }]
    }

    fn participant(id: &str, sex: &str, address: &str) -> participant::Model {
        participant::Model {
            id: id.to_string(),
            participant_type: ParticipantType::Student,
            name: format!("Student {id}"),
            sex: Some(sex.to_string()),
            age: Some(19),
            address: Some(address.to_string()),
            ethnic_group: Some("Higaonon".to_string()),
            other_ethnic_group: None,
            student_id: Some(format!("S-{id}")),
            school: None,
            year_level: None,
            section: None,
            staff_id: None,
            department: None,
            organization: None,
            event_id: "event1".to_string(),
            academic_period_id: "period1".to_string(),
            is_archived: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_summary_without_active_period() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<academic_period::Model>::new()])
            .append_query_results([count(12)])
            .append_query_results([count(4)])
            .append_query_results([count(2)])
            .append_query_results([count(3)])
            .into_connection();

        let summary = service(db).summary("admin1", true).await.unwrap();
        assert!(summary.active_period.is_none());
        assert_eq!(summary.events, 0);
        assert_eq!(summary.participants, 0);
        assert_eq!(
            summary.employees + summary.surveys + summary.pending_users + summary.unread_notifications,
            21
        );
    }

    #[tokio::test]
    async fn test_participant_analytics_requires_scope() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<academic_period::Model>::new()])
            .into_connection();

        let result = service(db).participant_analytics(None, None).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_participant_analytics_for_period() {
        let period = academic_period::Model {
            id: "period1".to_string(),
            school_year: "2024-2025".to_string(),
            period_type: academic_period::PeriodType::FirstSemester,
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            is_active: true,
            is_archived: false,
            archived_at: None,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[period]])
            .append_query_results([vec![
                participant("1", "Female", "Valencia City, Bukidnon"),
                participant("2", "male", "Cagayan de Oro"),
                participant("3", "M", "Iligan City"),
            ]])
            .into_connection();

        let analytics = service(db)
            .participant_analytics(Some("period1".to_string()), None)
            .await
            .unwrap();

        assert_eq!(analytics.academic_period_id.as_deref(), Some("period1"));
        assert_eq!(analytics.demographics.total_records, 3);
        assert_eq!(analytics.demographics.excluded_from_sex_totals, 1);
        assert_eq!(analytics.demographics.sex.total_recognized, 2);
        assert_eq!(analytics.locations.value, 3);
        assert_eq!(analytics.by_participant_type[0].total, 2);
    }

    #[tokio::test]
    async fn test_employee_analytics() {
        let employee = employee::Model {
            id: "e1".to_string(),
            employee_id: "EMP-001".to_string(),
            name: "Ana".to_string(),
            sex: Some("female".to_string()),
            age: Some(40),
            position: None,
            department: None,
            education_level: Some("Doctor of Philosophy".to_string()),
            civil_status: None,
            employment_status: None,
            address: None,
            ethnic_group: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[employee]])
            .into_connection();

        let analytics = service(db).employee_analytics().await.unwrap();
        assert_eq!(analytics.demographics.sex.female, 1);
        let doctorate = analytics
            .by_education
            .iter()
            .find(|b| b.total > 0)
            .unwrap();
        assert_eq!(doctorate.female, 1);
    }
}

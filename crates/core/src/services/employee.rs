//! Employee and survey service.

use crate::services::{
    activity_log::{ActivityEntry, ActivityLogService},
    event_publisher::{ChangeEvent, ChangeKind, Collection, EventPublisherService, publish},
};
use gad_common::{AppError, AppResult, IdGenerator};
use gad_db::{
    entities::{employee, employee_survey},
    repositories::{AcademicPeriodRepository, EmployeeRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Descriptive employee fields shared by manual entry and import.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDetails {
    #[validate(length(max = 256))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub sex: Option<String>,
    #[validate(range(min = 0, max = 150))]
    pub age: Option<i32>,
    #[validate(length(max = 256))]
    pub position: Option<String>,
    #[validate(length(max = 256))]
    pub department: Option<String>,
    #[validate(length(max = 256))]
    pub education_level: Option<String>,
    #[validate(length(max = 64))]
    pub civil_status: Option<String>,
    #[validate(length(max = 64))]
    pub employment_status: Option<String>,
    #[validate(length(max = 1024))]
    pub address: Option<String>,
    #[validate(length(max = 128))]
    pub ethnic_group: Option<String>,
}

impl EmployeeDetails {
    fn normalized(self) -> Self {
        Self {
            name: clean(self.name),
            sex: clean(self.sex),
            age: self.age,
            position: clean(self.position),
            department: clean(self.department),
            education_level: clean(self.education_level),
            civil_status: clean(self.civil_status),
            employment_status: clean(self.employment_status),
            address: clean(self.address),
            ethnic_group: clean(self.ethnic_group),
        }
    }

    /// Validate and build a new row.
    pub fn into_active_model(
        self,
        id: String,
        employee_id: &str,
    ) -> AppResult<employee::ActiveModel> {
        let employee_id = employee_id.trim();
        let details = self.normalized();

        let missing = if employee_id.is_empty() {
            Some("employee_id")
        } else if details.name.is_none() {
            Some("name")
        } else if details.sex.is_none() {
            Some("sex")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(AppError::Validation(format!(
                "missing required field: {field}"
            )));
        }

        Ok(employee::ActiveModel {
            id: Set(id),
            employee_id: Set(employee_id.to_string()),
            name: Set(details.name.unwrap_or_default()),
            sex: Set(details.sex),
            age: Set(details.age),
            position: Set(details.position),
            department: Set(details.department),
            education_level: Set(details.education_level),
            civil_status: Set(details.civil_status),
            employment_status: Set(details.employment_status),
            address: Set(details.address),
            ethnic_group: Set(details.ethnic_group),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        })
    }
}

/// Input for creating an employee.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeInput {
    pub employee_id: String,
    #[serde(flatten)]
    pub details: EmployeeDetails,
}

/// Input for submitting a survey response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSurveyInput {
    /// Defaults to the active period when there is one.
    pub academic_period_id: Option<String>,
    pub responses: serde_json::Value,
}

/// Employee service for business logic.
#[derive(Clone)]
pub struct EmployeeService {
    employee_repo: EmployeeRepository,
    period_repo: AcademicPeriodRepository,
    activity_log: ActivityLogService,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl EmployeeService {
    /// Create a new employee service.
    #[must_use]
    pub const fn new(
        employee_repo: EmployeeRepository,
        period_repo: AcademicPeriodRepository,
        activity_log: ActivityLogService,
    ) -> Self {
        Self {
            employee_repo,
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

    /// Create an employee record.
    pub async fn create(
        &self,
        actor_id: &str,
        input: CreateEmployeeInput,
    ) -> AppResult<employee::Model> {
        input.details.validate()?;

        if self
            .employee_repo
            .find_by_employee_id(input.employee_id.trim())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Employee ID already exists: {}",
                input.employee_id.trim()
            )));
        }

        let model = input
            .details
            .into_active_model(self.id_gen.generate(), &input.employee_id)?;
        let employee = self.employee_repo.create(model).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "employee.create", "employee")
                    .entity(&employee.employee_id),
            )
            .await;
        self.publish(Collection::Employees, ChangeKind::Created, &employee.employee_id, &employee)
            .await;

        Ok(employee)
    }

    /// Get an employee by employee ID.
    pub async fn get(&self, employee_id: &str) -> AppResult<employee::Model> {
        self.employee_repo.get_by_employee_id(employee_id).await
    }

    /// List employees by name with their total count.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<(Vec<employee::Model>, u64)> {
        let employees = self.employee_repo.find_all(limit, offset).await?;
        let total = self.employee_repo.count().await?;
        Ok((employees, total))
    }

    /// Replace an employee's descriptive fields.
    pub async fn update(
        &self,
        actor_id: &str,
        employee_id: &str,
        details: EmployeeDetails,
    ) -> AppResult<employee::Model> {
        details.validate()?;
        let existing = self.employee_repo.get_by_employee_id(employee_id).await?;
        let model = details.into_active_model(existing.id.clone(), &existing.employee_id)?;

        let mut active: employee::ActiveModel = existing.into();
        active.name = model.name;
        active.sex = model.sex;
        active.age = model.age;
        active.position = model.position;
        active.department = model.department;
        active.education_level = model.education_level;
        active.civil_status = model.civil_status;
        active.employment_status = model.employment_status;
        active.address = model.address;
        active.ethnic_group = model.ethnic_group;
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let employee = self.employee_repo.update(active).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "employee.update", "employee")
                    .entity(&employee.employee_id),
            )
            .await;
        self.publish(Collection::Employees, ChangeKind::Updated, &employee.employee_id, &employee)
            .await;

        Ok(employee)
    }

    /// Delete an employee and their survey responses.
    pub async fn delete(&self, actor_id: &str, employee_id: &str) -> AppResult<()> {
        self.employee_repo.delete(employee_id).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "employee.delete", "employee")
                    .entity(employee_id),
            )
            .await;
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent {
                collection: Collection::Employees,
                kind: ChangeKind::Deleted,
                id: Some(employee_id.to_string()),
                body: serde_json::Value::Null,
            },
        )
        .await;

        Ok(())
    }

    /// Record a survey response for an existing employee.
    pub async fn submit_survey(
        &self,
        actor_id: &str,
        employee_id: &str,
        input: SubmitSurveyInput,
    ) -> AppResult<employee_survey::Model> {
        if !input.responses.is_object() {
            return Err(AppError::Validation(
                "survey responses must be a JSON object".to_string(),
            ));
        }

        let employee = self.employee_repo.get_by_employee_id(employee_id).await?;

        let academic_period_id = self
            .period_repo
            .resolve(input.academic_period_id.as_deref())
            .await?
            .map(|p| p.id);

        let model = employee_survey::ActiveModel {
            id: Set(self.id_gen.generate()),
            employee_id: Set(employee.employee_id.clone()),
            academic_period_id: Set(academic_period_id),
            responses: Set(input.responses),
            submitted_at: Set(chrono::Utc::now().into()),
        };
        let survey = self.employee_repo.create_survey(model).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "survey.submit", "employee_survey")
                    .entity(&survey.id)
                    .details(employee.employee_id),
            )
            .await;
        self.publish(Collection::Surveys, ChangeKind::Created, &survey.id, &survey)
            .await;

        Ok(survey)
    }

    /// Survey responses of one employee.
    pub async fn surveys_for(&self, employee_id: &str) -> AppResult<Vec<employee_survey::Model>> {
        self.employee_repo.get_by_employee_id(employee_id).await?;
        self.employee_repo.find_surveys_by_employee(employee_id).await
    }

    /// All survey responses with their employees.
    pub async fn list_surveys(
        &self,
        academic_period_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<(employee_survey::Model, Option<employee::Model>)>, u64)> {
        let surveys = self
            .employee_repo
            .find_surveys(academic_period_id, limit, offset)
            .await?;
        let total = self
            .employee_repo
            .count_surveys(academic_period_id)
            .await?;
        Ok((surveys, total))
    }

    async fn publish<T: serde::Serialize + Sync>(
        &self,
        collection: Collection,
        kind: ChangeKind,
        id: &str,
        record: &T,
    ) {
        publish(
            self.event_publisher.as_ref(),
            ChangeEvent::record(collection, kind, id, record),
        )
        .await;
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

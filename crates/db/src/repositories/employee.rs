//! Employee and employee survey repository.

use std::sync::Arc;

use gad_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{Employee, EmployeeSurvey, employee, employee_survey};

/// Repository for employee and survey operations.
#[derive(Clone)]
pub struct EmployeeRepository {
    db: Arc<DatabaseConnection>,
}

impl EmployeeRepository {
    /// Create a new employee repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an employee by employee number.
    pub async fn find_by_employee_id(
        &self,
        employee_id: &str,
    ) -> AppResult<Option<employee::Model>> {
        Employee::find()
            .filter(employee::Column::EmployeeId.eq(employee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an employee by employee number, returning an error if not found.
    pub async fn get_by_employee_id(&self, employee_id: &str) -> AppResult<employee::Model> {
        self.find_by_employee_id(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee not found: {employee_id}")))
    }

    /// Create a new employee.
    pub async fn create(&self, model: employee::ActiveModel) -> AppResult<employee::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert many employees in one statement.
    pub async fn insert_many(&self, models: Vec<employee::ActiveModel>) -> AppResult<u64> {
        if models.is_empty() {
            return Ok(0);
        }

        Employee::insert_many(models)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an employee.
    pub async fn update(&self, model: employee::ActiveModel) -> AppResult<employee::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an employee and, through the foreign key, their surveys.
    pub async fn delete(&self, employee_id: &str) -> AppResult<()> {
        let employee = self.get_by_employee_id(employee_id).await?;
        employee
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List employees ordered by name.
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<employee::Model>> {
        Employee::find()
            .order_by_asc(employee::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Load every employee for aggregation.
    pub async fn find_everyone(&self) -> AppResult<Vec<employee::Model>> {
        Employee::find()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count employees.
    pub async fn count(&self) -> AppResult<u64> {
        Employee::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Surveys ====================

    /// Record a survey response.
    pub async fn create_survey(
        &self,
        model: employee_survey::ActiveModel,
    ) -> AppResult<employee_survey::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Survey responses of one employee, newest first.
    pub async fn find_surveys_by_employee(
        &self,
        employee_id: &str,
    ) -> AppResult<Vec<employee_survey::Model>> {
        EmployeeSurvey::find()
            .filter(employee_survey::Column::EmployeeId.eq(employee_id))
            .order_by_desc(employee_survey::Column::SubmittedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Survey responses joined to their employee, newest first.
    pub async fn find_surveys(
        &self,
        academic_period_id: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<(employee_survey::Model, Option<employee::Model>)>> {
        let mut query = EmployeeSurvey::find().find_also_related(Employee);

        if let Some(period_id) = academic_period_id {
            query = query.filter(employee_survey::Column::AcademicPeriodId.eq(period_id));
        }

        query
            .order_by_desc(employee_survey::Column::SubmittedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count survey responses, optionally within one academic period.
    pub async fn count_surveys(&self, academic_period_id: Option<&str>) -> AppResult<u64> {
        let mut query = EmployeeSurvey::find();

        if let Some(period_id) = academic_period_id {
            query = query.filter(employee_survey::Column::AcademicPeriodId.eq(period_id));
        }

        query
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
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn create_test_employee(employee_id: &str) -> employee::Model {
        employee::Model {
            id: format!("id-{employee_id}"),
            employee_id: employee_id.to_string(),
            name: "Ana Santos".to_string(),
            sex: Some("Female".to_string()),
            age: Some(38),
            position: Some("Instructor I".to_string()),
            department: Some("College of Education".to_string()),
            education_level: Some("Master's Degree".to_string()),
            civil_status: Some("Married".to_string()),
            employment_status: Some("Permanent".to_string()),
            address: None,
            ethnic_group: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_employee_id() {
        let emp = create_test_employee("EMP-001");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[emp]])
                .into_connection(),
        );

        let repo = EmployeeRepository::new(db);
        let found = repo.find_by_employee_id("EMP-001").await.unwrap().unwrap();

        assert_eq!(found.employee_id, "EMP-001");
    }

    #[tokio::test]
    async fn test_get_missing_employee() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<employee::Model>::new()])
                .into_connection(),
        );

        let repo = EmployeeRepository::new(db);
        assert!(matches!(
            repo.get_by_employee_id("EMP-404").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_surveys_by_employee() {
        let survey = employee_survey::Model {
            id: "s1".to_string(),
            employee_id: "EMP-001".to_string(),
            academic_period_id: None,
            responses: json!({"q1": "Agree"}),
            submitted_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[survey]])
                .into_connection(),
        );

        let repo = EmployeeRepository::new(db);
        let surveys = repo.find_surveys_by_employee("EMP-001").await.unwrap();

        assert_eq!(surveys.len(), 1);
        assert_eq!(surveys[0].responses["q1"], "Agree");
    }

    #[tokio::test]
    async fn test_count_surveys_in_period() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4)),
                }]])
                .into_connection(),
        );

        let repo = EmployeeRepository::new(Arc::clone(&db));
        assert_eq!(repo.count_surveys(Some("period1")).await.unwrap(), 4);
        drop(repo);

        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("WHERE"));
        assert!(log.contains("academic_period_id"));
        assert!(log.contains("period1"));
    }
}

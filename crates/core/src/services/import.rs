//! Batch import of participants and employees.
//!
//! Rows arrive as CSV text, a base64-encoded Excel workbook, or a JSON
//! array of objects. Each row is normalized into a record and validated
//! on its own; valid records are inserted in fixed-size batches, and a
//! failing batch is replayed one record at a time so every failure is
//! attributed to its row.

use std::{collections::HashMap, io::Cursor};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use gad_common::{AppError, AppResult, IdGenerator, config::ImportConfig};
use gad_db::{
    entities::{
        employee, event,
        notification::NotificationKind,
        participant::{self, ParticipantType},
    },
    repositories::{EmployeeRepository, EventRepository, ParticipantRepository},
};
use serde::{Deserialize, Serialize};

use crate::services::{
    activity_log::{ActivityEntry, ActivityLogService},
    employee::EmployeeDetails,
    event_publisher::{ChangeEvent, ChangeKind, Collection, EventPublisherService, publish},
    notification::NotificationService,
    participant::ParticipantDetails,
};

/// What is being imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Student,
    Staff,
    Community,
    Employees,
}

impl ImportKind {
    /// Parse the path segment of an import request.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" | "students" => Some(Self::Student),
            "staff" | "faculty" => Some(Self::Staff),
            "community" => Some(Self::Community),
            "employee" | "employees" => Some(Self::Employees),
            _ => None,
        }
    }

    /// Participant type for participant imports.
    #[must_use]
    pub const fn participant_type(self) -> Option<ParticipantType> {
        match self {
            Self::Student => Some(ParticipantType::Student),
            Self::Staff => Some(ParticipantType::Staff),
            Self::Community => Some(ParticipantType::Community),
            Self::Employees => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Staff => "staff",
            Self::Community => "community",
            Self::Employees => "employees",
        }
    }
}

/// Encoding of the `data` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    #[serde(alias = "excel")]
    Xlsx,
    Json,
}

/// An import request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub format: ImportFormat,
    /// CSV text, base64 workbook bytes, or a JSON array of objects
    /// (inline or as a string).
    pub data: serde_json::Value,
    /// Target event; required for participant imports.
    pub event_id: Option<String>,
}

/// A rejected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    /// 1-based position of the row in the input, header excluded.
    pub row: usize,
    pub identifier: Option<String>,
    pub error: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    fn fail(&mut self, row: usize, identifier: Option<String>, error: impl Into<String>) {
        let mut error = error.into();
        if error.is_empty() {
            error = "unknown error".to_string();
        }
        self.failed += 1;
        self.errors.push(ImportRowError {
            row,
            identifier,
            error,
        });
    }
}

/// A validated record waiting to be inserted.
#[derive(Debug, Clone)]
pub struct PendingRecord<M> {
    pub row: usize,
    pub identifier: Option<String>,
    pub model: M,
}

/// Destination of imported records.
#[async_trait]
pub trait RecordSink<M: Send + 'static>: Send + Sync {
    /// Insert every record in one statement.
    async fn insert_batch(&self, records: Vec<M>) -> AppResult<u64>;

    /// Insert a single record.
    async fn insert_one(&self, record: M) -> AppResult<()>;
}

#[async_trait]
impl RecordSink<participant::ActiveModel> for ParticipantRepository {
    async fn insert_batch(&self, records: Vec<participant::ActiveModel>) -> AppResult<u64> {
        self.insert_many(records).await
    }

    async fn insert_one(&self, record: participant::ActiveModel) -> AppResult<()> {
        self.create(record).await.map(|_| ())
    }
}

#[async_trait]
impl RecordSink<employee::ActiveModel> for EmployeeRepository {
    async fn insert_batch(&self, records: Vec<employee::ActiveModel>) -> AppResult<u64> {
        self.insert_many(records).await
    }

    async fn insert_one(&self, record: employee::ActiveModel) -> AppResult<()> {
        self.create(record).await.map(|_| ())
    }
}

/// Insert records in batches of `batch_size`, replaying failed batches
/// record by record. Outcomes are added to `report`.
pub async fn insert_in_batches<M, S>(
    sink: &S,
    records: Vec<PendingRecord<M>>,
    batch_size: usize,
    report: &mut ImportReport,
) where
    M: Clone + Send + 'static,
    S: RecordSink<M> + ?Sized,
{
    for chunk in records.chunks(batch_size.max(1)) {
        let models = chunk.iter().map(|r| r.model.clone()).collect();

        match sink.insert_batch(models).await {
            Ok(_) => report.successful += chunk.len(),
            Err(e) => {
                tracing::warn!(error = %e, size = chunk.len(), "Batch insert failed, retrying records individually");

                for record in chunk {
                    match sink.insert_one(record.model.clone()).await {
                        Ok(()) => report.successful += 1,
                        Err(e) => report.fail(record.row, record.identifier.clone(), e.to_string()),
                    }
                }
            }
        }
    }
}

/// A normalized input row.
pub type Row = HashMap<String, String>;

/// Normalize a column header: camelCase, spaces and dashes become
/// snake_case, punctuation is dropped, and known aliases are folded.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut prev: Option<char> = None;

    for c in header.trim().chars() {
        if c == ' ' || c == '-' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else if c.is_alphanumeric() {
            if c.is_uppercase()
                && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
                && !out.ends_with('_')
            {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        }
        prev = Some(c);
    }

    let out = out.trim_end_matches('_');
    match out {
        "gender" => "sex",
        "full_name" | "fullname" => "name",
        "ethnicity" | "ethnic_affiliation" => "ethnic_group",
        "employee_no" | "employee_number" | "emp_id" => "employee_id",
        "education" | "educational_attainment" | "highest_educational_attainment" => {
            "education_level"
        }
        "year" => "year_level",
        "organisation" => "organization",
        other => other,
    }
    .to_string()
}

/// Parse CSV text into records. Blank lines are skipped and records may
/// differ in length.
pub fn parse_csv(text: &str) -> AppResult<Vec<Vec<String>>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::BadRequest(format!("Invalid CSV data: {e}")))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        records.push(record.iter().map(ToString::to_string).collect());
    }

    Ok(records)
}

/// Rows of a CSV document keyed by normalized header.
pub fn rows_from_csv(text: &str) -> AppResult<Vec<Result<Row, String>>> {
    Ok(rows_from_records(parse_csv(text)?))
}

/// Decode a base64 workbook and read the rows of its first sheet.
pub fn rows_from_xlsx(encoded: &str) -> AppResult<Vec<Result<Row, String>>> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 workbook data: {e}")))?;

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::BadRequest(format!("Invalid Excel workbook: {e}")))?;
    let Some(sheet) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let sheet =
        sheet.map_err(|e| AppError::BadRequest(format!("Invalid Excel worksheet: {e}")))?;

    Ok(rows_from_records(sheet_records(&sheet)))
}

/// Cell text of every non-blank sheet row.
pub fn sheet_records(sheet: &Range<Data>) -> Vec<Vec<String>> {
    sheet
        .rows()
        .map(|cells| cells.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|record| !record.iter().all(|f| f.trim().is_empty()))
        .collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole numbers come back as floats; "20" not "20.0".
        Data::Float(f) if f.fract().abs() < f64::EPSILON => format!("{f:.0}"),
        other => other.to_string(),
    }
}

/// Key records by the normalized first record. A record whose length
/// differs from the header's is a row error.
fn rows_from_records(records: Vec<Vec<String>>) -> Vec<Result<Row, String>> {
    let mut records = records.into_iter();
    let Some(header) = records.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

    records
        .map(|record| -> Result<Row, String> {
            if record.len() != header.len() {
                return Err(format!(
                    "expected {} columns, found {}",
                    header.len(),
                    record.len()
                ));
            }
            Ok(header
                .iter()
                .zip(record)
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.clone(), value))
                .collect())
        })
        .collect()
}

/// Rows of a JSON array. Elements that are not objects become row errors.
pub fn rows_from_json(data: &serde_json::Value) -> AppResult<Vec<Result<Row, String>>> {
    let parsed;
    let data = match data {
        serde_json::Value::String(text) => {
            parsed = serde_json::from_str::<serde_json::Value>(text)
                .map_err(|e| AppError::BadRequest(format!("Invalid JSON data: {e}")))?;
            &parsed
        }
        other => other,
    };

    let items = data
        .as_array()
        .ok_or_else(|| AppError::BadRequest("JSON data must be an array of objects".to_string()))?;

    Ok(items
        .iter()
        .map(|item| -> Result<Row, String> {
            let object = item
                .as_object()
                .ok_or_else(|| "row is not a JSON object".to_string())?;
            Ok(object
                .iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::Null => return None,
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    Some((normalize_header(key), value))
                })
                .collect())
        })
        .collect())
}

fn field(row: &Row, key: &str) -> Option<String> {
    row.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn parse_age(row: &Row) -> Result<Option<i32>, String> {
    let Some(raw) = field(row, "age") else {
        return Ok(None);
    };
    match raw.parse::<i32>() {
        Ok(age) if (0..=150).contains(&age) => Ok(Some(age)),
        _ => Err(format!("invalid age: {raw}")),
    }
}

/// Build participant details from a row.
pub fn participant_from_row(row: &Row, kind: ParticipantType) -> Result<ParticipantDetails, String> {
    Ok(ParticipantDetails {
        participant_type: Some(kind),
        name: field(row, "name"),
        sex: field(row, "sex"),
        age: parse_age(row)?,
        address: field(row, "address"),
        ethnic_group: field(row, "ethnic_group"),
        other_ethnic_group: field(row, "other_ethnic_group"),
        student_id: field(row, "student_id"),
        school: field(row, "school"),
        year_level: field(row, "year_level"),
        section: field(row, "section"),
        staff_id: field(row, "staff_id"),
        department: field(row, "department"),
        organization: field(row, "organization"),
    })
}

/// Build employee details from a row.
pub fn employee_from_row(row: &Row) -> Result<EmployeeDetails, String> {
    Ok(EmployeeDetails {
        name: field(row, "name"),
        sex: field(row, "sex"),
        age: parse_age(row)?,
        position: field(row, "position"),
        department: field(row, "department"),
        education_level: field(row, "education_level"),
        civil_status: field(row, "civil_status"),
        employment_status: field(row, "employment_status"),
        address: field(row, "address"),
        ethnic_group: field(row, "ethnic_group"),
    })
}

fn strip_prefix(error: AppError) -> String {
    match error {
        AppError::Validation(msg) | AppError::BadRequest(msg) => msg,
        other => other.to_string(),
    }
}

/// Import service for business logic.
#[derive(Clone)]
pub struct ImportService {
    participant_repo: ParticipantRepository,
    employee_repo: EmployeeRepository,
    event_repo: EventRepository,
    activity_log: ActivityLogService,
    notification_service: NotificationService,
    event_publisher: Option<EventPublisherService>,
    config: ImportConfig,
    id_gen: IdGenerator,
}

impl ImportService {
    /// Create a new import service.
    #[must_use]
    pub const fn new(
        participant_repo: ParticipantRepository,
        employee_repo: EmployeeRepository,
        event_repo: EventRepository,
        activity_log: ActivityLogService,
        notification_service: NotificationService,
        config: ImportConfig,
    ) -> Self {
        Self {
            participant_repo,
            employee_repo,
            event_repo,
            activity_log,
            notification_service,
            event_publisher: None,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Run an import and report per-row outcomes.
    pub async fn import(
        &self,
        actor_id: &str,
        kind: ImportKind,
        request: ImportRequest,
    ) -> AppResult<ImportReport> {
        let rows = match request.format {
            ImportFormat::Csv => {
                let text = request.data.as_str().ok_or_else(|| {
                    AppError::BadRequest("CSV data must be a string".to_string())
                })?;
                rows_from_csv(text)?
            }
            ImportFormat::Xlsx => {
                let encoded = request.data.as_str().ok_or_else(|| {
                    AppError::BadRequest("Excel data must be a base64 string".to_string())
                })?;
                rows_from_xlsx(encoded)?
            }
            ImportFormat::Json => rows_from_json(&request.data)?,
        };

        if rows.len() > self.config.max_rows {
            return Err(AppError::BadRequest(format!(
                "Import exceeds the limit of {} rows",
                self.config.max_rows
            )));
        }

        let (report, target_event) = match kind.participant_type() {
            Some(participant_type) => {
                let event_id = request.event_id.as_deref().ok_or_else(|| {
                    AppError::BadRequest("eventId is required for participant imports".to_string())
                })?;
                let event = self.event_repo.get_by_id(event_id).await?;
                if event.is_archived {
                    return Err(AppError::BadRequest(
                        "Participants cannot be added to an archived event".to_string(),
                    ));
                }
                let report = self.import_participants(rows, participant_type, &event).await;
                (report, Some(event.id))
            }
            None => (self.import_employees(rows).await, None),
        };

        tracing::info!(
            kind = kind.as_str(),
            total = report.total,
            successful = report.successful,
            failed = report.failed,
            "Import finished"
        );
        self.finish(actor_id, kind, &report, target_event.as_deref()).await;

        Ok(report)
    }

    async fn import_participants(
        &self,
        rows: Vec<Result<Row, String>>,
        kind: ParticipantType,
        event: &event::Model,
    ) -> ImportReport {
        let mut report = ImportReport {
            total: rows.len(),
            ..ImportReport::default()
        };
        let mut pending = Vec::with_capacity(rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            let row_no = index + 1;
            let details = match row.and_then(|row| participant_from_row(&row, kind)) {
                Ok(details) => details,
                Err(error) => {
                    report.fail(row_no, None, error);
                    continue;
                }
            };

            let identifier = details.identifier();
            match details.into_active_model(
                self.id_gen.generate(),
                kind,
                &event.id,
                &event.academic_period_id,
            ) {
                Ok(model) => pending.push(PendingRecord {
                    row: row_no,
                    identifier,
                    model,
                }),
                Err(e) => report.fail(row_no, identifier, strip_prefix(e)),
            }
        }

        insert_in_batches(
            &self.participant_repo,
            pending,
            self.config.batch_size,
            &mut report,
        )
        .await;
        report
    }

    async fn import_employees(&self, rows: Vec<Result<Row, String>>) -> ImportReport {
        let mut report = ImportReport {
            total: rows.len(),
            ..ImportReport::default()
        };
        let mut pending = Vec::with_capacity(rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            let row_no = index + 1;
            let row = match row {
                Ok(row) => row,
                Err(error) => {
                    report.fail(row_no, None, error);
                    continue;
                }
            };

            let employee_id = field(&row, "employee_id").unwrap_or_default();
            let identifier = Some(employee_id.clone())
                .filter(|id| !id.is_empty())
                .or_else(|| field(&row, "name"));

            let model = employee_from_row(&row).and_then(|details| {
                details
                    .into_active_model(self.id_gen.generate(), &employee_id)
                    .map_err(strip_prefix)
            });
            match model {
                Ok(model) => pending.push(PendingRecord {
                    row: row_no,
                    identifier,
                    model,
                }),
                Err(error) => report.fail(row_no, identifier, error),
            }
        }

        insert_in_batches(&self.employee_repo, pending, self.config.batch_size, &mut report).await;
        report
    }

    async fn finish(
        &self,
        actor_id: &str,
        kind: ImportKind,
        report: &ImportReport,
        event_id: Option<&str>,
    ) {
        let summary = format!(
            "{}: {} of {} rows imported, {} failed",
            kind.as_str(),
            report.successful,
            report.total,
            report.failed
        );

        let entity_type = if kind == ImportKind::Employees {
            "employee"
        } else {
            "participant"
        };
        let mut entry = ActivityEntry::success(Some(actor_id), "import", entity_type)
            .details(summary.clone());
        if let Some(event_id) = event_id {
            entry = entry.entity(event_id);
        }
        if report.successful == 0 && report.failed > 0 {
            entry = entry.failed();
        }
        self.activity_log.record(entry).await;

        if report.successful > 0 {
            let collection = if kind == ImportKind::Employees {
                Collection::Employees
            } else {
                Collection::Participants
            };
            publish(
                self.event_publisher.as_ref(),
                ChangeEvent::bulk(
                    collection,
                    ChangeKind::Created,
                    serde_json::json!({
                        "imported": report.successful,
                        "eventId": event_id,
                    }),
                ),
            )
            .await;
        }

        if let Err(e) = self
            .notification_service
            .notify(actor_id, NotificationKind::ImportCompleted, "Import completed", &summary)
            .await
        {
            tracing::warn!(error = %e, "Failed to send import notification");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use gad_db::{
        entities::event::EventType,
        repositories::{ActivityLogRepository, NotificationRepository, UserRepository},
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
    use std::sync::{Arc, Mutex};

    /// Accepts everything except records starting with "bad".
    #[derive(Default)]
    struct FakeSink {
        stored: Mutex<Vec<String>>,
        batches: Mutex<usize>,
    }

    #[async_trait]
    impl RecordSink<String> for FakeSink {
        async fn insert_batch(&self, records: Vec<String>) -> AppResult<u64> {
            *self.batches.lock().unwrap() += 1;
            if records.iter().any(|r| r.starts_with("bad")) {
                return Err(AppError::Database("duplicate key".to_string()));
            }
            let n = records.len() as u64;
            self.stored.lock().unwrap().extend(records);
            Ok(n)
        }

        async fn insert_one(&self, record: String) -> AppResult<()> {
            if record.starts_with("bad") {
                return Err(AppError::Database(format!("rejected {record}")));
            }
            self.stored.lock().unwrap().push(record);
            Ok(())
        }
    }

    fn pending(values: &[&str]) -> Vec<PendingRecord<String>> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| PendingRecord {
                row: i + 1,
                identifier: Some((*v).to_string()),
                model: (*v).to_string(),
            })
            .collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Student ID"), "student_id");
        assert_eq!(normalize_header("studentId"), "student_id");
        assert_eq!(normalize_header("  Ethnic-Group "), "ethnic_group");
        assert_eq!(normalize_header("otherEthnicGroup"), "other_ethnic_group");
        assert_eq!(normalize_header("Gender"), "sex");
        assert_eq!(normalize_header("Full Name"), "name");
        assert_eq!(normalize_header("Employee No."), "employee_id");
        assert_eq!(
            normalize_header("Highest Educational Attainment"),
            "education_level"
        );
    }

    #[test]
    fn test_parse_csv_quotes_and_blank_lines() {
        let text = "name,address\r\n\"Cruz, Juan\",\"Zone 1\nValencia\"\r\n\r\n\"Say \"\"hi\"\"\",x\n";
        let records = parse_csv(text).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], ["Cruz, Juan", "Zone 1\nValencia"]);
        assert_eq!(records[2], ["Say \"hi\"", "x"]);
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let text = "name,sex\nAna O\"Neil,female\nBen,male\nCy O\"Brien,male\nDee,female\n";
        let rows = rows_from_csv(text).unwrap();
        assert_eq!(rows.len(), 4);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first["name"], "Ana O\"Neil");
        assert_eq!(first["sex"], "female");
        assert_eq!(rows[2].as_ref().unwrap()["name"], "Cy O\"Brien");
    }

    #[test]
    fn test_rows_from_csv_uses_normalized_headers() {
        let rows = rows_from_csv("\u{feff}Full Name,Gender,Age\nAna,Female,20\nBen,Male,\n").unwrap();
        assert_eq!(rows.len(), 2);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first["name"], "Ana");
        assert_eq!(first["sex"], "Female");
        assert_eq!(first["age"], "20");
        assert_eq!(rows[1].as_ref().unwrap()["age"], "");
    }

    #[test]
    fn test_ragged_csv_rows_are_row_errors() {
        let rows = rows_from_csv("name,sex\nAna,female,EXTRA-DATA\nBen\nCy,male\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap_err(), "expected 2 columns, found 3");
        assert_eq!(rows[1].as_ref().unwrap_err(), "expected 2 columns, found 1");
        assert_eq!(rows[2].as_ref().unwrap()["name"], "Cy");
    }

    #[test]
    fn test_sheet_records() {
        let mut sheet = Range::new((0, 0), (3, 2));
        sheet.set_value((0, 0), Data::String("Employee No.".to_string()));
        sheet.set_value((0, 1), Data::String("Full Name".to_string()));
        sheet.set_value((0, 2), Data::String("Age".to_string()));
        sheet.set_value((1, 0), Data::Float(1001.0));
        sheet.set_value((1, 1), Data::String("Ana".to_string()));
        sheet.set_value((1, 2), Data::Int(34));
        // row 2 left blank
        sheet.set_value((3, 0), Data::String("E-7".to_string()));
        sheet.set_value((3, 1), Data::String("Ben".to_string()));
        sheet.set_value((3, 2), Data::Float(41.5));

        let records = sheet_records(&sheet);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], ["1001", "Ana", "34"]);

        let rows = rows_from_records(records);
        assert_eq!(rows.len(), 2);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first["employee_id"], "1001");
        assert_eq!(first["name"], "Ana");
        assert_eq!(rows[1].as_ref().unwrap()["age"], "41.5");
    }

    #[test]
    fn test_rows_from_xlsx_rejects_bad_input() {
        assert!(matches!(
            rows_from_xlsx("not base64!"),
            Err(AppError::BadRequest(msg)) if msg.starts_with("Invalid base64")
        ));
        // valid base64, not a workbook
        assert!(matches!(
            rows_from_xlsx("aGVsbG8gd29ybGQ="),
            Err(AppError::BadRequest(msg)) if msg.starts_with("Invalid Excel workbook")
        ));
    }

    #[test]
    fn test_import_request_formats() {
        let request: ImportRequest = serde_json::from_value(serde_json::json!({
            "format": "xlsx",
            "data": "UEsDBA==",
            "eventId": "event1",
        }))
        .unwrap();
        assert_eq!(request.format, ImportFormat::Xlsx);
        assert_eq!(request.event_id.as_deref(), Some("event1"));

        let request: ImportRequest =
            serde_json::from_value(serde_json::json!({ "format": "excel", "data": "" })).unwrap();
        assert_eq!(request.format, ImportFormat::Xlsx);

        assert!(
            serde_json::from_value::<ImportRequest>(serde_json::json!({ "format": "xml", "data": "" }))
                .is_err()
        );
    }

    #[test]
    fn test_rows_from_json() {
        let data = serde_json::json!([
            { "name": "Ana", "age": 20, "studentId": "S-1", "section": null },
            "not an object"
        ]);
        let rows = rows_from_json(&data).unwrap();
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first["age"], "20");
        assert_eq!(first["student_id"], "S-1");
        assert!(!first.contains_key("section"));
        assert_eq!(rows[1].as_ref().unwrap_err(), "row is not a JSON object");

        let as_string = serde_json::Value::String("[{\"name\":\"Ben\"}]".to_string());
        assert_eq!(rows_from_json(&as_string).unwrap().len(), 1);

        assert!(rows_from_json(&serde_json::json!({"name": "x"})).is_err());
    }

    #[test]
    fn test_participant_from_row_rejects_bad_age() {
        let row: Row = [("name", "Ana"), ("sex", "female"), ("age", "twenty")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let err = participant_from_row(&row, ParticipantType::Community).unwrap_err();
        assert_eq!(err, "invalid age: twenty");
    }

    #[test]
    fn test_participant_row_missing_required_field() {
        let row: Row = [("name", "Ana"), ("sex", "female")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let details = participant_from_row(&row, ParticipantType::Student).unwrap();
        let err = details
            .into_active_model("id".to_string(), ParticipantType::Student, "e1", "p1")
            .map_err(strip_prefix)
            .unwrap_err();
        assert_eq!(err, "missing required field: student_id");
    }

    #[test]
    fn test_import_kind_parse() {
        assert_eq!(ImportKind::parse("Students"), Some(ImportKind::Student));
        assert_eq!(ImportKind::parse("employees"), Some(ImportKind::Employees));
        assert_eq!(ImportKind::parse("alumni"), None);
        assert_eq!(ImportKind::Employees.participant_type(), None);
    }

    #[tokio::test]
    async fn test_insert_in_batches_all_good() {
        let sink = FakeSink::default();
        let mut report = ImportReport {
            total: 5,
            ..ImportReport::default()
        };

        insert_in_batches(&sink, pending(&["a", "b", "c", "d", "e"]), 2, &mut report).await;

        assert_eq!(report.successful, 5);
        assert_eq!(report.failed, 0);
        assert_eq!(*sink.batches.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_single_inserts() {
        let sink = FakeSink::default();
        let mut report = ImportReport {
            total: 5,
            ..ImportReport::default()
        };

        insert_in_batches(
            &sink,
            pending(&["a", "b", "bad-c", "d", "bad-e"]),
            3,
            &mut report,
        )
        .await;

        assert_eq!(report.successful, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.successful + report.failed, report.total);
        assert_eq!(
            report.errors.iter().map(|e| e.row).collect::<Vec<_>>(),
            [3, 5]
        );
        assert!(report.errors.iter().all(|e| !e.error.is_empty()));
        assert_eq!(sink.stored.lock().unwrap().len(), 3);
    }

    fn import_service(db: DatabaseConnection, config: ImportConfig) -> ImportService {
        let db = Arc::new(db);
        ImportService::new(
            ParticipantRepository::new(Arc::clone(&db)),
            EmployeeRepository::new(Arc::clone(&db)),
            EventRepository::new(Arc::clone(&db)),
            ActivityLogService::new(ActivityLogRepository::new(Arc::clone(&db))),
            NotificationService::new(NotificationRepository::new(Arc::clone(&db)), UserRepository::new(db)),
            config,
        )
    }

    fn create_test_event(is_archived: bool) -> event::Model {
        event::Model {
            id: "event1".to_string(),
            name: "Gender Sensitivity Seminar".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            venue: "AVR".to_string(),
            event_type: EventType::Academic,
            category: "Seminar".to_string(),
            duration_minutes: 120,
            created_by: "admin1".to_string(),
            academic_period_id: "period1".to_string(),
            is_archived,
            show_on_homepage: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_employee(employee_id: &str) -> employee::Model {
        employee::Model {
            id: format!("id-{employee_id}"),
            employee_id: employee_id.to_string(),
            name: "Dee".to_string(),
            sex: Some("female".to_string()),
            age: None,
            position: None,
            department: None,
            education_level: None,
            civil_status: None,
            employment_status: None,
            address: None,
            ethnic_group: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn json_request(data: serde_json::Value, event_id: Option<&str>) -> ImportRequest {
        ImportRequest {
            format: ImportFormat::Json,
            data,
            event_id: event_id.map(ToString::to_string),
        }
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    #[tokio::test]
    async fn test_import_employees_mixed_outcomes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // first batch succeeds, second batch fails
            .append_exec_results([exec(2)])
            .append_exec_errors([DbErr::Custom("duplicate key".to_string())])
            // single-record replay of the failed batch
            .append_query_results([[create_test_employee("E-4")]])
            .append_query_errors([DbErr::Custom("duplicate key value: E-5".to_string())])
            .into_connection();
        let service = import_service(
            db,
            ImportConfig {
                batch_size: 2,
                max_rows: 100,
            },
        );

        let data = serde_json::json!([
            { "employeeId": "E-1", "name": "Ana", "sex": "female" },
            { "employeeId": "E-2", "name": "Ben", "sex": "male", "age": "old" },
            { "employeeId": "E-3", "name": "Cy", "sex": "male" },
            { "employeeId": "E-4", "name": "Dee", "sex": "female" },
            { "employeeId": "E-5", "name": "Eve", "sex": "female" },
            { "name": "No Number", "sex": "female" },
        ]);
        let report = service
            .import("admin1", ImportKind::Employees, json_request(data, None))
            .await
            .unwrap();

        assert_eq!(report.total, 6);
        assert_eq!(report.successful, 3);
        assert_eq!(report.failed, 3);
        assert_eq!(report.successful + report.failed, report.total);

        let failed: Vec<_> = report
            .errors
            .iter()
            .map(|e| (e.row, e.identifier.as_deref()))
            .collect();
        assert_eq!(
            failed,
            [(2, Some("E-2")), (6, Some("No Number")), (5, Some("E-5"))]
        );
        assert_eq!(report.errors[0].error, "invalid age: old");
        assert_eq!(report.errors[1].error, "missing required field: employee_id");
    }

    #[tokio::test]
    async fn test_import_participants_into_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_event(false)]])
            .append_exec_results([exec(1)])
            .into_connection();
        let service = import_service(db, ImportConfig::default());

        let request = ImportRequest {
            format: ImportFormat::Csv,
            data: serde_json::Value::String(
                "Student ID,Full Name,Gender\nS-1,Ana,female\n,Ben,male\n".to_string(),
            ),
            event_id: Some("event1".to_string()),
        };
        let report = service
            .import("admin1", ImportKind::Student, request)
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(report.errors[0].error, "missing required field: student_id");
    }

    #[tokio::test]
    async fn test_participant_import_requires_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let result = import_service(db, ImportConfig::default())
            .import(
                "admin1",
                ImportKind::Community,
                json_request(serde_json::json!([{ "name": "Ana", "sex": "female" }]), None),
            )
            .await;

        match result {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "eventId is required for participant imports");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_import_into_archived_event_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_event(true)]])
            .into_connection();
        let result = import_service(db, ImportConfig::default())
            .import(
                "admin1",
                ImportKind::Community,
                json_request(
                    serde_json::json!([{ "name": "Ana", "sex": "female" }]),
                    Some("event1"),
                ),
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_import_row_limit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = import_service(
            db,
            ImportConfig {
                batch_size: 50,
                max_rows: 2,
            },
        );

        let data = serde_json::json!([
            { "employeeId": "E-1", "name": "Ana", "sex": "female" },
            { "employeeId": "E-2", "name": "Ben", "sex": "male" },
            { "employeeId": "E-3", "name": "Cy", "sex": "male" },
        ]);
        let result = service
            .import("admin1", ImportKind::Employees, json_request(data, None))
            .await;

        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Import exceeds the limit of 2 rows"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_csv_and_excel_data_must_be_strings() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = import_service(db, ImportConfig::default());

        for format in [ImportFormat::Csv, ImportFormat::Xlsx] {
            let request = ImportRequest {
                format,
                data: serde_json::json!([]),
                event_id: None,
            };
            let result = service
                .import("admin1", ImportKind::Employees, request)
                .await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }
}

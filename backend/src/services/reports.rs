//! Saved report definitions and their evaluation over a project's tasks.

use crate::error::{AppError, AppResult};
use crate::models::{
    NewReport, Priority, Report, ReportChanges, Task, TaskStatus, Visualization,
};
use crate::repository::Repositories;
use crate::services::access::{require_member, require_writer};
use crate::services::{nullable, projects::required_name};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportField {
    Title,
    Status,
    Priority,
    Assignee,
    Section,
    DueDate,
    CreatedAt,
    CompletedAt,
}

impl ReportField {
    pub fn key(&self) -> &'static str {
        match self {
            ReportField::Title => "title",
            ReportField::Status => "status",
            ReportField::Priority => "priority",
            ReportField::Assignee => "assignee",
            ReportField::Section => "section",
            ReportField::DueDate => "dueDate",
            ReportField::CreatedAt => "createdAt",
            ReportField::CompletedAt => "completedAt",
        }
    }

    fn read(&self, task: &Task) -> Cell {
        match self {
            ReportField::Title => Cell::Text(task.title.clone()),
            ReportField::Status => status_cell(task.status),
            ReportField::Priority => priority_cell(task.priority),
            ReportField::Assignee => task.assignee_id.map_or(Cell::Null, |id| Cell::Number(id.into())),
            ReportField::Section => task.section_id.map_or(Cell::Null, |id| Cell::Number(id.into())),
            ReportField::DueDate => task.due_date.map_or(Cell::Null, Cell::Time),
            ReportField::CreatedAt => Cell::Time(task.created_at),
            ReportField::CompletedAt => task.completed_at.map_or(Cell::Null, Cell::Time),
        }
    }

    /// Coerce a filter operand to this field's type.
    fn operand(&self, value: &JsonValue) -> Result<Cell, String> {
        if value.is_null() {
            return Ok(Cell::Null);
        }
        let text = || {
            value
                .as_str()
                .ok_or_else(|| format!("{} expects a string, got {}", self.key(), value))
        };
        match self {
            ReportField::Title => Ok(Cell::Text(text()?.to_string())),
            ReportField::Status => text()?
                .parse::<TaskStatus>()
                .map(status_cell)
                .map_err(|e| e.to_string()),
            ReportField::Priority => text()?
                .parse::<Priority>()
                .map(priority_cell)
                .map_err(|e| e.to_string()),
            ReportField::Assignee | ReportField::Section => value
                .as_i64()
                .map(Cell::Number)
                .ok_or_else(|| format!("{} expects an id, got {}", self.key(), value)),
            ReportField::DueDate | ReportField::CreatedAt | ReportField::CompletedAt => {
                parse_instant(text()?)
                    .map(Cell::Time)
                    .ok_or_else(|| format!("{} expects a date, got {}", self.key(), value))
            }
        }
    }
}

fn status_cell(status: TaskStatus) -> Cell {
    let rank = TaskStatus::ALL.iter().position(|s| *s == status).unwrap_or_default();
    Cell::Rank(rank, status.as_str())
}

fn priority_cell(priority: Priority) -> Cell {
    let rank = Priority::ALL.iter().position(|p| *p == priority).unwrap_or_default();
    Cell::Rank(rank, priority.as_str())
}

/// RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` timestamp, or a bare date (midnight UTC).
fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// A single task value, typed for comparison. Enums compare by declaration
/// order, so `priority greater_than MEDIUM` means HIGH or URGENT.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Text(String),
    Rank(usize, &'static str),
    Number(i64),
    Time(NaiveDateTime),
}

impl Cell {
    fn compare(&self, other: &Cell) -> Option<Ordering> {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => Some(a.cmp(b)),
            (Cell::Rank(a, _), Cell::Rank(b, _)) => Some(a.cmp(b)),
            (Cell::Number(a), Cell::Number(b)) => Some(a.cmp(b)),
            (Cell::Time(a), Cell::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn equals(&self, other: &Cell) -> bool {
        matches!((self, other), (Cell::Null, Cell::Null))
            || self.compare(other) == Some(Ordering::Equal)
    }

    fn label(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Rank(_, s) => s.to_string(),
            Cell::Number(n) => n.to_string(),
            Cell::Time(t) => t.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Cell::Null => JsonValue::Null,
            Cell::Number(n) => JsonValue::from(*n),
            other => JsonValue::String(other.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    Between,
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportFilter {
    pub field: ReportField,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: JsonValue,
}

#[derive(Debug)]
enum Condition {
    Equals(Cell),
    Contains(String),
    GreaterThan(Cell),
    LessThan(Cell),
    Between(Cell, Cell),
    In(Vec<Cell>),
}

#[derive(Debug)]
struct CompiledFilter {
    field: ReportField,
    condition: Condition,
}

impl ReportFilter {
    fn compile(&self) -> Result<CompiledFilter, String> {
        let field = self.field;
        let list = || {
            self.value
                .as_array()
                .ok_or_else(|| format!("{:?} on {} expects a list", self.operator, field.key()))
        };
        let condition = match self.operator {
            FilterOperator::Equals => Condition::Equals(field.operand(&self.value)?),
            FilterOperator::Contains => Condition::Contains(
                self.value
                    .as_str()
                    .ok_or_else(|| format!("contains on {} expects a string", field.key()))?
                    .to_lowercase(),
            ),
            FilterOperator::GreaterThan => Condition::GreaterThan(field.operand(&self.value)?),
            FilterOperator::LessThan => Condition::LessThan(field.operand(&self.value)?),
            FilterOperator::Between => match list()?.as_slice() {
                [low, high] => Condition::Between(field.operand(low)?, field.operand(high)?),
                _ => return Err(format!("between on {} expects two bounds", field.key())),
            },
            FilterOperator::In => Condition::In(
                list()?
                    .iter()
                    .map(|v| field.operand(v))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(CompiledFilter { field, condition })
    }
}

impl CompiledFilter {
    fn matches(&self, task: &Task) -> bool {
        let cell = self.field.read(task);
        match &self.condition {
            Condition::Equals(v) => cell.equals(v),
            Condition::Contains(needle) => cell.label().to_lowercase().contains(needle.as_str()),
            Condition::GreaterThan(v) => cell.compare(v) == Some(Ordering::Greater),
            Condition::LessThan(v) => cell.compare(v) == Some(Ordering::Less),
            Condition::Between(low, high) => {
                matches!(cell.compare(low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(cell.compare(high), Some(Ordering::Less | Ordering::Equal))
            }
            Condition::In(values) => values.iter().any(|v| cell.equals(v)),
        }
    }
}

fn compile_all(filters: &[ReportFilter]) -> AppResult<Vec<CompiledFilter>> {
    filters
        .iter()
        .map(|f| f.compile().map_err(AppError::validation))
        .collect()
}

fn require_fields(fields: &[ReportField]) -> AppResult<()> {
    if fields.is_empty() {
        return Err(AppError::validation("A report needs at least one field"));
    }
    Ok(())
}

fn to_column<T: Serialize>(value: &T) -> AppResult<JsonValue> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<ReportField>,
    #[serde(default)]
    pub filters: Vec<ReportFilter>,
    #[serde(default)]
    pub visualization: Option<Visualization>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub fields: Option<Vec<ReportField>>,
    pub filters: Option<Vec<ReportFilter>>,
    pub visualization: Option<Visualization>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupCount {
    pub key: JsonValue,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    pub report_id: i32,
    pub name: String,
    pub visualization: Visualization,
    pub columns: Vec<ReportField>,
    pub rows: Vec<Map<String, JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<usize>,
    pub generated_at: NaiveDateTime,
}

/// Counts per distinct value of `field`, ordered by value.
fn group_by(tasks: &[&Task], field: ReportField) -> Vec<GroupCount> {
    let mut groups: BTreeMap<String, GroupCount> = BTreeMap::new();
    for task in tasks {
        let cell = field.read(task);
        groups
            .entry(cell.label())
            .or_insert_with(|| GroupCount {
                key: cell.to_json(),
                count: 0,
            })
            .count += 1;
    }
    groups.into_values().collect()
}

pub struct ReportService {
    repos: Repositories,
}

impl ReportService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    fn find(&self, report_id: i32) -> AppResult<Report> {
        self.repos
            .reports
            .find_report(report_id)?
            .ok_or_else(|| AppError::not_found("Report"))
    }

    pub fn create(
        &self,
        user_id: i32,
        project_id: i32,
        input: CreateReportInput,
    ) -> AppResult<Report> {
        require_writer(&self.repos, project_id, user_id)?;
        let name = required_name(&input.name, "Report name")?;
        require_fields(&input.fields)?;
        compile_all(&input.filters)?;

        Ok(self.repos.reports.insert_report(NewReport {
            project_id,
            name,
            description: input.description,
            fields: to_column(&input.fields)?,
            filters: to_column(&input.filters)?,
            visualization: input.visualization.unwrap_or(Visualization::Table),
            created_by: user_id,
        })?)
    }

    pub fn list(&self, user_id: i32, project_id: i32) -> AppResult<Vec<Report>> {
        require_member(&self.repos, project_id, user_id)?;
        Ok(self.repos.reports.list_reports(project_id)?)
    }

    pub fn get(&self, user_id: i32, report_id: i32) -> AppResult<Report> {
        let report = self.find(report_id)?;
        require_member(&self.repos, report.project_id, user_id)?;
        Ok(report)
    }

    pub fn update(
        &self,
        user_id: i32,
        report_id: i32,
        input: UpdateReportInput,
    ) -> AppResult<Report> {
        let report = self.find(report_id)?;
        require_writer(&self.repos, report.project_id, user_id)?;

        if let Some(fields) = &input.fields {
            require_fields(fields)?;
        }
        if let Some(filters) = &input.filters {
            compile_all(filters)?;
        }

        let changes = ReportChanges {
            name: input
                .name
                .as_deref()
                .map(|n| required_name(n, "Report name"))
                .transpose()?,
            description: input.description,
            fields: input.fields.as_ref().map(to_column).transpose()?,
            filters: input.filters.as_ref().map(to_column).transpose()?,
            visualization: input.visualization,
        };
        Ok(self.repos.reports.update_report(report_id, changes)?)
    }

    pub fn delete(&self, user_id: i32, report_id: i32) -> AppResult<()> {
        let report = self.find(report_id)?;
        require_writer(&self.repos, report.project_id, user_id)?;
        Ok(self.repos.reports.delete_report(report_id)?)
    }

    pub fn generate(&self, user_id: i32, report_id: i32) -> AppResult<GeneratedReport> {
        let report = self.get(user_id, report_id)?;

        let invalid = |e: serde_json::Error| {
            AppError::validation(format!("Report {} has an invalid definition: {}", report.id, e))
        };
        let fields: Vec<ReportField> =
            serde_json::from_value(report.fields.clone()).map_err(invalid)?;
        let filters: Vec<ReportFilter> =
            serde_json::from_value(report.filters.clone()).map_err(invalid)?;
        require_fields(&fields)?;
        let filters = compile_all(&filters)?;

        let tasks = self.repos.tasks.list_tasks(report.project_id, None)?;
        let selected: Vec<&Task> = tasks
            .iter()
            .filter(|task| filters.iter().all(|f| f.matches(task)))
            .collect();

        let rows = selected
            .iter()
            .map(|task| {
                let mut row = Map::new();
                row.insert("id".to_string(), JsonValue::from(task.id));
                for field in &fields {
                    row.insert(field.key().to_string(), field.read(task).to_json());
                }
                row
            })
            .collect();

        let (groups, value) = match report.visualization {
            Visualization::Bar | Visualization::Line | Visualization::Pie => {
                (Some(group_by(&selected, fields[0])), None)
            }
            Visualization::Metric => (None, Some(selected.len())),
            Visualization::Table => (None, None),
        };

        log::debug!(
            "Report {} generated: {} of {} tasks",
            report.id,
            selected.len(),
            tasks.len()
        );

        Ok(GeneratedReport {
            report_id: report.id,
            name: report.name,
            visualization: report.visualization,
            columns: fields,
            rows,
            groups,
            value,
            generated_at: Utc::now().naive_utc(),
        })
    }
}

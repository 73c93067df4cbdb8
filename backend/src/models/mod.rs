use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

mod enums;
mod rules;

pub use enums::{
    ActionType, LogStatus, MemberRole, NotificationType, ParseEnumError, Priority, TaskStatus,
    TriggerType, Visualization,
};
pub use rules::{
    ActionConfig, AssignTaskParams, CreateTaskParams, MoveTaskParams, SendEmailParams,
    SendNotificationParams, TriggerConditions, UpdatePriorityParams,
};

// ============================================================================
// Users
// ============================================================================

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::projects)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::projects)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner_id: i32,
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::projects)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::project_members)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub project_id: i32,
    pub user_id: i32,
    pub role: MemberRole,
    pub joined_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::project_members)]
pub struct NewProjectMember {
    pub project_id: i32,
    pub user_id: i32,
    pub role: MemberRole,
}

// ============================================================================
// Sections & tasks
// ============================================================================

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::sections)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub position: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::sections)]
pub struct NewSection {
    pub project_id: i32,
    pub name: String,
    pub position: i32,
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::sections)]
pub struct SectionChanges {
    pub name: Option<String>,
    pub position: Option<i32>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::tasks)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub project_id: i32,
    pub section_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: Option<i32>,
    pub creator_id: i32,
    pub due_date: Option<NaiveDateTime>,
    pub position: i32,
    pub completed_at: Option<NaiveDateTime>,
    pub reminder_sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTask {
    pub project_id: i32,
    pub section_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee_id: Option<i32>,
    pub creator_id: i32,
    pub due_date: Option<NaiveDateTime>,
    pub position: i32,
}

/// Partial task update. `Some(None)` clears a nullable column.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::tasks)]
pub struct TaskChanges {
    pub section_id: Option<Option<i32>>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Option<i32>>,
    pub due_date: Option<Option<NaiveDateTime>>,
    pub position: Option<i32>,
    pub completed_at: Option<Option<NaiveDateTime>>,
    pub reminder_sent_at: Option<Option<NaiveDateTime>>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::comments)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub task_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment {
    pub task_id: i32,
    pub author_id: i32,
    pub content: String,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::notifications)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_task_id: Option<i32>,
    pub related_project_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification {
    pub user_id: i32,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_task_id: Option<i32>,
    pub related_project_id: Option<i32>,
}

#[derive(
    Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::notification_preferences)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: i32,
    pub task_assigned: bool,
    pub task_updated: bool,
    pub task_completed: bool,
    pub comment_added: bool,
    pub project_invite: bool,
    pub due_date_reminder: bool,
    pub automation: bool,
    pub email_notifications: bool,
    pub updated_at: NaiveDateTime,
}

impl NotificationPreferences {
    /// Preferences used when the user never saved any: everything enabled.
    pub fn enabled_for(user_id: i32, now: NaiveDateTime) -> Self {
        Self {
            user_id,
            task_assigned: true,
            task_updated: true,
            task_completed: true,
            comment_added: true,
            project_invite: true,
            due_date_reminder: true,
            automation: true,
            email_notifications: true,
            updated_at: now,
        }
    }

    pub fn allows(&self, kind: NotificationType) -> bool {
        match kind {
            NotificationType::TaskAssigned => self.task_assigned,
            NotificationType::TaskUpdated => self.task_updated,
            NotificationType::TaskCompleted => self.task_completed,
            NotificationType::CommentAdded => self.comment_added,
            NotificationType::ProjectInvite => self.project_invite,
            NotificationType::DueDateReminder => self.due_date_reminder,
            NotificationType::Automation => self.automation,
        }
    }
}

// ============================================================================
// Automations
// ============================================================================

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::automations)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    pub trigger_conditions: Option<JsonValue>,
    pub action_type: ActionType,
    pub action_parameters: JsonValue,
    pub is_active: bool,
    pub project_id: Option<i32>,
    pub created_by: i32,
    pub execution_count: i32,
    pub last_executed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::automations)]
pub struct NewAutomation {
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    pub trigger_conditions: Option<JsonValue>,
    pub action_type: ActionType,
    pub action_parameters: JsonValue,
    pub is_active: bool,
    pub project_id: Option<i32>,
    pub created_by: i32,
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::automations)]
pub struct AutomationChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub trigger_type: Option<TriggerType>,
    pub trigger_conditions: Option<Option<JsonValue>>,
    pub action_type: Option<ActionType>,
    pub action_parameters: Option<JsonValue>,
    pub is_active: Option<bool>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::automation_logs)]
#[serde(rename_all = "camelCase")]
pub struct AutomationLog {
    pub id: i32,
    pub automation_id: i32,
    pub status: LogStatus,
    pub trigger_data: JsonValue,
    pub action_result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
    pub related_task_id: Option<i32>,
    pub triggered_by: Option<i32>,
    pub executed_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::automation_logs)]
pub struct NewAutomationLog {
    pub automation_id: i32,
    pub status: LogStatus,
    pub trigger_data: JsonValue,
    pub action_result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
    pub related_task_id: Option<i32>,
    pub triggered_by: Option<i32>,
}

// ============================================================================
// Reports & integrations
// ============================================================================

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::reports)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub fields: JsonValue,
    pub filters: JsonValue,
    pub visualization: Visualization,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::reports)]
pub struct NewReport {
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub fields: JsonValue,
    pub filters: JsonValue,
    pub visualization: Visualization,
    pub created_by: i32,
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::reports)]
pub struct ReportChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub fields: Option<JsonValue>,
    pub filters: Option<JsonValue>,
    pub visualization: Option<Visualization>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::integrations)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: i32,
    pub project_id: i32,
    pub provider: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub secret: String,
    pub is_active: bool,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::integrations)]
pub struct NewIntegration {
    pub project_id: i32,
    pub provider: String,
    pub name: String,
    pub secret: String,
    pub created_by: i32,
}

// ============================================================================
// Pagination
// ============================================================================

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalize a requested window: negative offsets become 0 and the limit is
/// clamped to `1..=MAX_PAGE_SIZE`.
pub fn page_window(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let offset = offset.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (offset, limit)
}

/// One page of a listing, echoing the requested window.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, offset: i64, limit: i64) -> Self {
        let has_more = offset + (items.len() as i64) < total;
        Self {
            items,
            total,
            offset,
            limit,
            has_more,
        }
    }
}

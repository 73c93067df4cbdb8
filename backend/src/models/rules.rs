//! Typed shapes of the JSON stored in `automations.trigger_conditions` and
//! `automations.action_parameters`.

use super::{ActionType, Priority, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Equality constraints on an event payload. Every present key must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TriggerConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_section_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl TriggerConditions {
    /// Parse the stored column. A SQL or JSON null means "no conditions".
    pub fn from_column(value: Option<&JsonValue>) -> Result<Option<Self>, serde_json::Error> {
        match value {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskParams {
    pub assignee_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationParams {
    #[serde(default)]
    pub user_id: Option<i32>,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskParams {
    pub section_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskParams {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section_id: Option<i32>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriorityParams {
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailParams {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// An action together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionConfig {
    AssignTask(AssignTaskParams),
    SendNotification(SendNotificationParams),
    MoveTask(MoveTaskParams),
    CreateTask(CreateTaskParams),
    UpdatePriority(UpdatePriorityParams),
    SendEmail(SendEmailParams),
}

impl ActionConfig {
    pub fn parse(action_type: ActionType, params: &JsonValue) -> Result<Self, serde_json::Error> {
        let params = params.clone();
        Ok(match action_type {
            ActionType::AssignTask => Self::AssignTask(serde_json::from_value(params)?),
            ActionType::SendNotification => {
                Self::SendNotification(serde_json::from_value(params)?)
            }
            ActionType::MoveTask => Self::MoveTask(serde_json::from_value(params)?),
            ActionType::CreateTask => Self::CreateTask(serde_json::from_value(params)?),
            ActionType::UpdatePriority => Self::UpdatePriority(serde_json::from_value(params)?),
            ActionType::SendEmail => Self::SendEmail(serde_json::from_value(params)?),
        })
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::AssignTask(_) => ActionType::AssignTask,
            Self::SendNotification(_) => ActionType::SendNotification,
            Self::MoveTask(_) => ActionType::MoveTask,
            Self::CreateTask(_) => ActionType::CreateTask,
            Self::UpdatePriority(_) => ActionType::UpdatePriority,
            Self::SendEmail(_) => ActionType::SendEmail,
        }
    }
}

//! Domain events raised by mutations and fed to the automation engine.

use crate::models::{Priority, Task, TaskStatus, TriggerType};
use crate::realtime::{NotificationHub, ServerEvent};
use crate::services::automation_engine::{AutomationEngine, ExecutionResult};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Facts about an event that trigger conditions can match on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
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
    pub previous_assignee_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub trigger: TriggerType,
    pub project_id: Option<i32>,
    pub actor_id: Option<i32>,
    pub payload: EventPayload,
}

impl DomainEvent {
    pub fn new(trigger: TriggerType, project_id: Option<i32>, actor_id: Option<i32>) -> Self {
        Self {
            trigger,
            project_id,
            actor_id,
            payload: EventPayload {
                project_id,
                ..Default::default()
            },
        }
    }

    /// Event about `task`, with the payload describing its current state.
    pub fn for_task(trigger: TriggerType, task: &Task, actor_id: Option<i32>) -> Self {
        Self {
            trigger,
            project_id: Some(task.project_id),
            actor_id,
            payload: EventPayload {
                task_id: Some(task.id),
                task_title: Some(task.title.clone()),
                project_id: Some(task.project_id),
                section_id: task.section_id,
                status: Some(task.status),
                priority: Some(task.priority),
                assignee_id: task.assignee_id,
                ..Default::default()
            },
        }
    }

    pub fn task_id(&self) -> Option<i32> {
        self.payload.task_id
    }
}

/// Routes domain events to project rooms and the automation engine.
pub struct EventDispatcher {
    engine: Arc<AutomationEngine>,
    hub: Arc<NotificationHub>,
}

impl EventDispatcher {
    pub fn new(engine: Arc<AutomationEngine>, hub: Arc<NotificationHub>) -> Self {
        Self { engine, hub }
    }

    pub fn publish(&self, event: DomainEvent) -> Vec<ExecutionResult> {
        if let Some(project_id) = event.project_id {
            self.hub.emit_to_project(
                project_id,
                &ServerEvent::ProjectActivity {
                    project_id,
                    trigger: event.trigger,
                    task_id: event.task_id(),
                    actor_id: event.actor_id,
                },
            );
        }

        let results = self.engine.dispatch(&event);
        if !results.is_empty() {
            log::info!(
                "{} event triggered {} automation(s)",
                event.trigger,
                results.len()
            );
        }
        results
    }
}

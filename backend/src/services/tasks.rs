use crate::error::{AppError, AppResult};
use crate::models::{
    NewNotification, NewTask, NotificationType, Priority, Task, TaskChanges, TaskStatus,
    TriggerType,
};
use crate::repository::Repositories;
use crate::services::access::{require_member, require_writer};
use crate::services::events::{DomainEvent, EventDispatcher};
use crate::services::notifications::NotificationService;
use crate::services::{nullable, projects::required_name};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section_id: Option<i32>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Absent fields are untouched; `null` clears a nullable field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskInput {
    pub section_id: Option<i32>,
    #[serde(default)]
    pub position: Option<i32>,
}

pub struct TaskService {
    repos: Repositories,
    notifications: Arc<NotificationService>,
    events: Arc<EventDispatcher>,
}

/// Event for a change from `before` to `after`, carrying the previous values.
fn change_event(
    trigger: TriggerType,
    before: &Task,
    after: &Task,
    actor_id: i32,
) -> DomainEvent {
    let mut event = DomainEvent::for_task(trigger, after, Some(actor_id));
    event.payload.previous_status = Some(before.status);
    event.payload.previous_priority = Some(before.priority);
    event.payload.previous_section_id = before.section_id;
    event.payload.previous_assignee_id = before.assignee_id;
    event
}

impl TaskService {
    pub fn new(
        repos: Repositories,
        notifications: Arc<NotificationService>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            repos,
            notifications,
            events,
        }
    }

    fn find(&self, task_id: i32) -> AppResult<Task> {
        self.repos
            .tasks
            .find_task(task_id)?
            .ok_or_else(|| AppError::not_found("Task"))
    }

    fn require_section_in(&self, section_id: i32, project_id: i32) -> AppResult<()> {
        match self.repos.sections.find_section(section_id)? {
            Some(section) if section.project_id == project_id => Ok(()),
            Some(_) => Err(AppError::validation(
                "Section belongs to another project",
            )),
            None => Err(AppError::not_found("Section")),
        }
    }

    fn require_assignable(&self, assignee_id: i32, project_id: i32) -> AppResult<()> {
        match self.repos.projects.find_member(project_id, assignee_id)? {
            Some(_) => Ok(()),
            None => Err(AppError::validation(
                "Assignee must be a member of the project",
            )),
        }
    }

    /// Notify `recipient` unless they caused the change themselves. The task
    /// is already saved, so a failure is logged and not returned.
    fn notify_other(
        &self,
        recipient: i32,
        actor_id: i32,
        kind: NotificationType,
        title: &str,
        message: String,
        task: &Task,
    ) {
        if recipient == actor_id {
            return;
        }
        if let Err(e) = self.notifications.notify(NewNotification {
            user_id: recipient,
            kind,
            title: title.to_string(),
            message,
            related_task_id: Some(task.id),
            related_project_id: Some(task.project_id),
        }) {
            log::error!(
                "Failed to notify user {} about task {}: {}",
                recipient, task.id, e
            );
        }
    }

    pub fn create(&self, user_id: i32, project_id: i32, input: CreateTaskInput) -> AppResult<Task> {
        require_writer(&self.repos, project_id, user_id)?;
        let title = required_name(&input.title, "Task title")?;
        if let Some(section_id) = input.section_id {
            self.require_section_in(section_id, project_id)?;
        }
        if let Some(assignee_id) = input.assignee_id {
            self.require_assignable(assignee_id, project_id)?;
        }

        let position = self
            .repos
            .tasks
            .next_task_position(project_id, input.section_id)?;
        let task = self.repos.tasks.insert_task(NewTask {
            project_id,
            section_id: input.section_id,
            title,
            description: input.description,
            status: input.status.unwrap_or(TaskStatus::Todo),
            priority: input.priority.unwrap_or(Priority::Medium),
            assignee_id: input.assignee_id,
            creator_id: user_id,
            due_date: input.due_date.map(|d| d.naive_utc()),
            position,
        })?;

        if let Some(assignee_id) = task.assignee_id {
            self.notify_other(
                assignee_id,
                user_id,
                NotificationType::TaskAssigned,
                "Task assigned",
                format!("You have been assigned to \"{}\"", task.title),
                &task,
            );
        }

        self.events
            .publish(DomainEvent::for_task(TriggerType::TaskCreated, &task, Some(user_id)));
        self.find(task.id)
    }

    pub fn get(&self, user_id: i32, task_id: i32) -> AppResult<Task> {
        let task = self.find(task_id)?;
        require_member(&self.repos, task.project_id, user_id)?;
        Ok(task)
    }

    pub fn list(
        &self,
        user_id: i32,
        project_id: i32,
        section_id: Option<i32>,
    ) -> AppResult<Vec<Task>> {
        require_member(&self.repos, project_id, user_id)?;
        Ok(self.repos.tasks.list_tasks(project_id, section_id)?)
    }

    pub fn update(&self, user_id: i32, task_id: i32, input: UpdateTaskInput) -> AppResult<Task> {
        let before = self.find(task_id)?;
        require_writer(&self.repos, before.project_id, user_id)?;
        if let Some(Some(assignee_id)) = input.assignee_id {
            self.require_assignable(assignee_id, before.project_id)?;
        }

        let now = Utc::now().naive_utc();
        let mut changes = TaskChanges {
            title: input
                .title
                .as_deref()
                .map(|t| required_name(t, "Task title"))
                .transpose()?,
            description: input.description,
            status: input.status,
            priority: input.priority,
            assignee_id: input.assignee_id,
            due_date: input.due_date.map(|d| d.map(|d| d.naive_utc())),
            position: input.position,
            ..Default::default()
        };
        match input.status {
            Some(TaskStatus::Done) if before.status != TaskStatus::Done => {
                changes.completed_at = Some(Some(now));
            }
            Some(status) if status != TaskStatus::Done && before.status == TaskStatus::Done => {
                changes.completed_at = Some(None);
            }
            _ => {}
        }
        if changes.due_date.is_some() {
            // A new due date re-arms the reminder.
            changes.reminder_sent_at = Some(None);
        }

        let after = self.repos.tasks.update_task(task_id, changes)?;

        let assignee_changed = before.assignee_id != after.assignee_id;
        let priority_changed = before.priority != after.priority;
        let status_changed = before.status != after.status;
        let completed = status_changed && after.status == TaskStatus::Done;

        if assignee_changed {
            if let Some(assignee_id) = after.assignee_id {
                self.notify_other(
                    assignee_id,
                    user_id,
                    NotificationType::TaskAssigned,
                    "Task assigned",
                    format!("You have been assigned to \"{}\"", after.title),
                    &after,
                );
            }
        } else if let Some(assignee_id) = after.assignee_id {
            self.notify_other(
                assignee_id,
                user_id,
                NotificationType::TaskUpdated,
                "Task updated",
                format!("\"{}\" was updated", after.title),
                &after,
            );
        }
        if completed {
            self.notify_other(
                after.creator_id,
                user_id,
                NotificationType::TaskCompleted,
                "Task completed",
                format!("\"{}\" has been completed", after.title),
                &after,
            );
        }

        self.events.publish(change_event(
            TriggerType::TaskUpdated,
            &before,
            &after,
            user_id,
        ));
        if assignee_changed {
            self.events.publish(change_event(
                TriggerType::TaskAssigned,
                &before,
                &after,
                user_id,
            ));
        }
        if priority_changed {
            self.events.publish(change_event(
                TriggerType::PriorityChanged,
                &before,
                &after,
                user_id,
            ));
        }
        if status_changed {
            self.events.publish(change_event(
                TriggerType::StatusChanged,
                &before,
                &after,
                user_id,
            ));
        }
        if completed {
            self.events.publish(change_event(
                TriggerType::TaskCompleted,
                &before,
                &after,
                user_id,
            ));
        }

        self.find(task_id)
    }

    /// Move a task to another section (or out of any section with `None`).
    pub fn move_to(&self, user_id: i32, task_id: i32, input: MoveTaskInput) -> AppResult<Task> {
        let before = self.find(task_id)?;
        require_writer(&self.repos, before.project_id, user_id)?;
        if let Some(section_id) = input.section_id {
            self.require_section_in(section_id, before.project_id)?;
        }

        let position = match input.position {
            Some(position) => position,
            None => self
                .repos
                .tasks
                .next_task_position(before.project_id, input.section_id)?,
        };
        let after = self.repos.tasks.update_task(
            task_id,
            TaskChanges {
                section_id: Some(input.section_id),
                position: Some(position),
                ..Default::default()
            },
        )?;

        self.events
            .publish(change_event(TriggerType::TaskMoved, &before, &after, user_id));
        self.find(task_id)
    }

    pub fn delete(&self, user_id: i32, task_id: i32) -> AppResult<()> {
        let task = self.find(task_id)?;
        require_writer(&self.repos, task.project_id, user_id)?;
        self.repos.tasks.delete_task(task_id)?;
        log::info!("Task {} deleted by user {}", task_id, user_id);
        Ok(())
    }
}

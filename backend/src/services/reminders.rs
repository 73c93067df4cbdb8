use crate::error::AppResult;
use crate::models::{NewNotification, NotificationType, TaskChanges, TriggerType};
use crate::repository::Repositories;
use crate::services::events::{DomainEvent, EventDispatcher};
use crate::services::notifications::NotificationService;
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;

/// How far ahead a due date counts as "due soon".
pub const REMINDER_WINDOW_HOURS: i64 = 24;

pub struct ReminderService {
    repos: Repositories,
    notifications: Arc<NotificationService>,
    events: Arc<EventDispatcher>,
}

impl ReminderService {
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

    /// Remind about open tasks due in `[now, now + 24h)` that were not
    /// reminded yet. Returns how many tasks were processed.
    pub fn run(&self, now: NaiveDateTime) -> AppResult<usize> {
        let until = now + Duration::hours(REMINDER_WINDOW_HOURS);
        let due = self.repos.tasks.list_tasks_due_between(now, until)?;

        for task in &due {
            if let Some(assignee_id) = task.assignee_id {
                let when = task
                    .due_date
                    .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_default();
                self.notifications.notify(NewNotification {
                    user_id: assignee_id,
                    kind: NotificationType::DueDateReminder,
                    title: "Task due soon".to_string(),
                    message: format!("\"{}\" is due {}", task.title, when),
                    related_task_id: Some(task.id),
                    related_project_id: Some(task.project_id),
                })?;
            }

            self.repos.tasks.update_task(
                task.id,
                TaskChanges {
                    reminder_sent_at: Some(Some(now)),
                    ..Default::default()
                },
            )?;
            self.events
                .publish(DomainEvent::for_task(TriggerType::TaskDueSoon, task, None));
        }

        if !due.is_empty() {
            log::info!("Sent due-date reminders for {} task(s)", due.len());
        }
        Ok(due.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{
        ActionType, LogStatus, NewAutomation, NewUser, Priority, TaskStatus,
    };
    use crate::services::projects::CreateProjectInput;
    use crate::services::tasks::{CreateTaskInput, UpdateTaskInput};
    use crate::state::AppState;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    struct Fixture {
        state: AppState,
        user_id: i32,
        project_id: i32,
    }

    fn setup() -> Fixture {
        let (state, _) = AppState::in_memory(AppConfig::default());
        let user_id = state
            .repos
            .users
            .insert_user(NewUser {
                email: "due@example.com".to_string(),
                name: "Due".to_string(),
                password_hash: "x".to_string(),
            })
            .unwrap()
            .id;
        let project_id = state
            .projects
            .create(
                user_id,
                CreateProjectInput {
                    name: "Deadlines".to_string(),
                    description: None,
                    color: None,
                },
            )
            .unwrap()
            .id;
        Fixture {
            state,
            user_id,
            project_id,
        }
    }

    impl Fixture {
        fn task(&self, title: &str, due_hour: Option<u32>, status: TaskStatus) -> i32 {
            self.state
                .tasks
                .create(
                    self.user_id,
                    self.project_id,
                    CreateTaskInput {
                        title: title.to_string(),
                        status: Some(status),
                        assignee_id: Some(self.user_id),
                        due_date: due_hour
                            .map(|h| Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap() + Duration::hours(h.into())),
                        ..Default::default()
                    },
                )
                .unwrap()
                .id
        }
    }

    fn now() -> NaiveDateTime {
        Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap().naive_utc()
    }

    #[test]
    fn test_reminds_only_tasks_inside_window() {
        let fixture = setup();
        let soon = fixture.task("Soon", Some(5), TaskStatus::Todo);
        fixture.task("Later", Some(30), TaskStatus::Todo);
        fixture.task("Done already", Some(5), TaskStatus::Done);
        fixture.task("Someday", None, TaskStatus::Todo);

        assert_eq!(fixture.state.reminders.run(now()).unwrap(), 1);

        let unread = fixture.state.notifications.unread(fixture.user_id).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationType::DueDateReminder);
        assert_eq!(unread[0].related_task_id, Some(soon));
        let task = fixture.state.tasks.get(fixture.user_id, soon).unwrap();
        assert_eq!(task.reminder_sent_at, Some(now()));
    }

    #[test]
    fn test_second_run_does_not_repeat() {
        let fixture = setup();
        fixture.task("Soon", Some(1), TaskStatus::InProgress);

        assert_eq!(fixture.state.reminders.run(now()).unwrap(), 1);
        assert_eq!(fixture.state.reminders.run(now()).unwrap(), 0);
        assert_eq!(
            fixture.state.notifications.unread_count(fixture.user_id).unwrap(),
            1
        );
    }

    #[test]
    fn test_rescheduling_rearms_reminder() {
        let fixture = setup();
        let id = fixture.task("Soon", Some(1), TaskStatus::Todo);
        fixture.state.reminders.run(now()).unwrap();

        fixture
            .state
            .tasks
            .update(
                fixture.user_id,
                id,
                UpdateTaskInput {
                    due_date: Some(Some(Utc.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap())),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(fixture.state.reminders.run(now()).unwrap(), 1);
    }

    #[test]
    fn test_due_soon_event_reaches_automations() {
        let fixture = setup();
        let automation = fixture
            .state
            .repos
            .automations
            .insert_automation(NewAutomation {
                name: "Escalate".to_string(),
                description: None,
                trigger_type: TriggerType::TaskDueSoon,
                trigger_conditions: None,
                action_type: ActionType::UpdatePriority,
                action_parameters: json!({"priority": "URGENT"}),
                is_active: true,
                project_id: Some(fixture.project_id),
                created_by: fixture.user_id,
            })
            .unwrap();
        let id = fixture.task("Soon", Some(2), TaskStatus::Todo);

        fixture.state.reminders.run(now()).unwrap();

        let logs = fixture
            .state
            .repos
            .automations
            .list_automation_logs(automation.id, 0, 10)
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Success);
        let task = fixture.state.tasks.get(fixture.user_id, id).unwrap();
        assert_eq!(task.priority, Priority::Urgent);
    }
}

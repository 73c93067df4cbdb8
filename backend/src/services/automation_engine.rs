use crate::{
    error::{AppError, RepoError},
    models::{
        ActionConfig, AssignTaskParams, Automation, CreateTaskParams, LogStatus, MoveTaskParams,
        NewAutomationLog, NewNotification, NewTask, NotificationType, Priority, SendEmailParams,
        SendNotificationParams, TaskChanges, TaskStatus, TriggerConditions, TriggerType,
        UpdatePriorityParams,
    },
    repository::Repositories,
    services::{
        email::{EmailError, EmailOutbox, OutgoingEmail},
        events::{DomainEvent, EventPayload},
        notifications::NotificationService,
    },
};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Result of evaluating an automation against an event
#[derive(Debug, Clone, PartialEq)]
pub enum RuleEvaluation {
    Matched,
    NotMatched,
    /// Stored conditions could not be read; recorded as a skipped run.
    Misconfigured(String),
}

/// Result of running (or skipping) one automation
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub automation_id: i32,
    pub status: LogStatus,
    pub action_result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Invalid action parameters: {0}")]
    InvalidParameters(#[from] serde_json::Error),
    #[error("{0} event carries no task")]
    MissingTask(TriggerType),
    #[error("{0} event carries no project")]
    MissingProject(TriggerType),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Section {0} belongs to another project")]
    ForeignSection(i32),
    #[error("User {0} is not a member of project {1}")]
    NotMember(i32, i32),
    #[error(transparent)]
    Repository(#[from] RepoError),
    #[error(transparent)]
    Service(#[from] AppError),
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Matches domain events against stored automations and runs their actions.
///
/// Actions write through the repositories directly, so they never raise
/// further domain events.
pub struct AutomationEngine {
    repos: Repositories,
    notifications: Arc<NotificationService>,
    email: EmailOutbox,
}

impl AutomationEngine {
    pub fn new(
        repos: Repositories,
        notifications: Arc<NotificationService>,
        email: EmailOutbox,
    ) -> Self {
        Self {
            repos,
            notifications,
            email,
        }
    }

    /// Run every active automation listening for `event`. Never fails: action
    /// errors end up in the automation log.
    pub fn dispatch(&self, event: &DomainEvent) -> Vec<ExecutionResult> {
        let mut results = Vec::new();

        let automations = match self
            .repos
            .automations
            .list_active_automations(event.trigger, event.project_id)
        {
            Ok(a) => a,
            Err(e) => {
                error!("Failed to load automations for {}: {}", event.trigger, e);
                return results;
            }
        };

        if automations.is_empty() {
            return results;
        }

        let trigger_data = serde_json::to_value(event).unwrap_or(JsonValue::Null);

        for automation in automations {
            if !self.within_reach(&automation, event) {
                continue;
            }

            let result = match evaluate(&automation, &event.payload) {
                RuleEvaluation::NotMatched => continue,
                RuleEvaluation::Misconfigured(reason) => {
                    warn!(
                        "Automation '{}' (id={}) skipped: {}",
                        automation.name, automation.id, reason
                    );
                    ExecutionResult {
                        automation_id: automation.id,
                        status: LogStatus::Skipped,
                        action_result: None,
                        error_message: Some(reason),
                        execution_time_ms: 0,
                    }
                }
                RuleEvaluation::Matched => {
                    info!(
                        "Automation '{}' (id={}) triggered by {}",
                        automation.name, automation.id, event.trigger
                    );
                    let result = self.execute_rule(&automation, event);
                    if let Err(e) = self
                        .repos
                        .automations
                        .record_automation_run(automation.id, Utc::now().naive_utc())
                    {
                        error!("Failed to record run of automation {}: {}", automation.id, e);
                    }
                    result
                }
            };

            self.log_execution(&result, event, &trigger_data);
            results.push(result);
        }

        results
    }

    /// A global automation only sees events from projects its creator belongs to.
    fn within_reach(&self, automation: &Automation, event: &DomainEvent) -> bool {
        let (None, Some(project_id)) = (automation.project_id, event.project_id) else {
            return true;
        };
        match self
            .repos
            .projects
            .find_member(project_id, automation.created_by)
        {
            Ok(member) => member.is_some(),
            Err(e) => {
                error!(
                    "Failed to check membership for automation {}: {}",
                    automation.id, e
                );
                false
            }
        }
    }

    fn execute_rule(&self, automation: &Automation, event: &DomainEvent) -> ExecutionResult {
        let started = Instant::now();
        let outcome = self.execute_action(automation, event);
        let execution_time_ms = started.elapsed().as_millis() as i64;

        match outcome {
            Ok(action_result) => ExecutionResult {
                automation_id: automation.id,
                status: LogStatus::Success,
                action_result: Some(action_result),
                error_message: None,
                execution_time_ms,
            },
            Err(e) => {
                warn!(
                    "Automation '{}' (id={}) failed: {}",
                    automation.name, automation.id, e
                );
                ExecutionResult {
                    automation_id: automation.id,
                    status: LogStatus::Failed,
                    action_result: None,
                    error_message: Some(e.to_string()),
                    execution_time_ms,
                }
            }
        }
    }

    fn execute_action(
        &self,
        automation: &Automation,
        event: &DomainEvent,
    ) -> Result<JsonValue, ActionError> {
        match ActionConfig::parse(automation.action_type, &automation.action_parameters)? {
            ActionConfig::AssignTask(params) => self.assign_task(event, params),
            ActionConfig::SendNotification(params) => {
                self.send_notification(automation, event, params)
            }
            ActionConfig::MoveTask(params) => self.move_task(event, params),
            ActionConfig::CreateTask(params) => self.create_task(automation, event, params),
            ActionConfig::UpdatePriority(params) => self.update_priority(event, params),
            ActionConfig::SendEmail(params) => self.send_email(event, params),
        }
    }

    fn assign_task(
        &self,
        event: &DomainEvent,
        params: AssignTaskParams,
    ) -> Result<JsonValue, ActionError> {
        let task_id = event.task_id().ok_or(ActionError::MissingTask(event.trigger))?;
        let task = self
            .repos
            .tasks
            .find_task(task_id)?
            .ok_or(ActionError::NotFound("task"))?;
        if self.repos.users.find_user(params.assignee_id)?.is_none() {
            return Err(ActionError::NotFound("user"));
        }
        if self
            .repos
            .projects
            .find_member(task.project_id, params.assignee_id)?
            .is_none()
        {
            return Err(ActionError::NotMember(params.assignee_id, task.project_id));
        }

        let task = self.repos.tasks.update_task(
            task.id,
            TaskChanges {
                assignee_id: Some(Some(params.assignee_id)),
                ..Default::default()
            },
        )?;

        self.notifications.notify(NewNotification {
            user_id: params.assignee_id,
            kind: NotificationType::TaskAssigned,
            title: "Task assigned".to_string(),
            message: format!("You have been assigned to \"{}\"", task.title),
            related_task_id: Some(task.id),
            related_project_id: Some(task.project_id),
        })?;

        Ok(json!({ "taskId": task.id, "assigneeId": params.assignee_id }))
    }

    fn send_notification(
        &self,
        automation: &Automation,
        event: &DomainEvent,
        params: SendNotificationParams,
    ) -> Result<JsonValue, ActionError> {
        let recipient = params
            .user_id
            .or(event.payload.assignee_id)
            .unwrap_or(automation.created_by);

        let delivered = self.notifications.notify(NewNotification {
            user_id: recipient,
            kind: NotificationType::Automation,
            title: render(&params.title, event),
            message: render(&params.message, event),
            related_task_id: event.task_id(),
            related_project_id: event.project_id,
        })?;

        Ok(json!({
            "userId": recipient,
            "notificationId": delivered.as_ref().map(|n| n.id),
            "delivered": delivered.is_some(),
        }))
    }

    fn move_task(&self, event: &DomainEvent, params: MoveTaskParams) -> Result<JsonValue, ActionError> {
        let task_id = event.task_id().ok_or(ActionError::MissingTask(event.trigger))?;
        let task = self
            .repos
            .tasks
            .find_task(task_id)?
            .ok_or(ActionError::NotFound("task"))?;
        let section = self
            .repos
            .sections
            .find_section(params.section_id)?
            .ok_or(ActionError::NotFound("section"))?;
        if section.project_id != task.project_id {
            return Err(ActionError::ForeignSection(section.id));
        }

        let position = self
            .repos
            .tasks
            .next_task_position(task.project_id, Some(section.id))?;
        let moved = self.repos.tasks.update_task(
            task.id,
            TaskChanges {
                section_id: Some(Some(section.id)),
                position: Some(position),
                ..Default::default()
            },
        )?;

        Ok(json!({
            "taskId": moved.id,
            "sectionId": section.id,
            "previousSectionId": task.section_id,
        }))
    }

    fn create_task(
        &self,
        automation: &Automation,
        event: &DomainEvent,
        params: CreateTaskParams,
    ) -> Result<JsonValue, ActionError> {
        let project_id = event
            .project_id
            .ok_or(ActionError::MissingProject(event.trigger))?;

        if let Some(section_id) = params.section_id {
            let section = self
                .repos
                .sections
                .find_section(section_id)?
                .ok_or(ActionError::NotFound("section"))?;
            if section.project_id != project_id {
                return Err(ActionError::ForeignSection(section_id));
            }
        }

        let position = self
            .repos
            .tasks
            .next_task_position(project_id, params.section_id)?;
        let task = self.repos.tasks.insert_task(NewTask {
            project_id,
            section_id: params.section_id,
            title: render(&params.title, event),
            description: params.description.as_deref().map(|d| render(d, event)),
            status: TaskStatus::Todo,
            priority: params.priority.unwrap_or(Priority::Medium),
            assignee_id: params.assignee_id,
            creator_id: automation.created_by,
            due_date: None,
            position,
        })?;

        if let Some(assignee_id) = task.assignee_id {
            self.notifications.notify(NewNotification {
                user_id: assignee_id,
                kind: NotificationType::TaskAssigned,
                title: "Task assigned".to_string(),
                message: format!("You have been assigned to \"{}\"", task.title),
                related_task_id: Some(task.id),
                related_project_id: Some(project_id),
            })?;
        }

        Ok(json!({ "taskId": task.id, "projectId": project_id }))
    }

    fn update_priority(
        &self,
        event: &DomainEvent,
        params: UpdatePriorityParams,
    ) -> Result<JsonValue, ActionError> {
        let task_id = event.task_id().ok_or(ActionError::MissingTask(event.trigger))?;
        let task = self.repos.tasks.update_task(
            task_id,
            TaskChanges {
                priority: Some(params.priority),
                ..Default::default()
            },
        )?;

        Ok(json!({
            "taskId": task.id,
            "priority": task.priority,
            "previousPriority": event.payload.priority,
        }))
    }

    fn send_email(&self, event: &DomainEvent, params: SendEmailParams) -> Result<JsonValue, ActionError> {
        let email = OutgoingEmail {
            to: render(&params.to, event),
            subject: render(&params.subject, event),
            body: render(&params.body, event),
        };
        let result = json!({ "to": email.to, "subject": email.subject, "queued": true });
        self.email.enqueue(email)?;
        Ok(result)
    }

    fn log_execution(&self, result: &ExecutionResult, event: &DomainEvent, trigger_data: &JsonValue) {
        let entry = NewAutomationLog {
            automation_id: result.automation_id,
            status: result.status,
            trigger_data: trigger_data.clone(),
            action_result: result.action_result.clone(),
            error_message: result.error_message.clone(),
            execution_time_ms: result.execution_time_ms,
            related_task_id: event.task_id(),
            triggered_by: event.actor_id,
        };

        if let Err(e) = self.repos.automations.insert_automation_log(entry) {
            error!("Failed to log execution: {}", e);
        }
    }
}

/// Decide whether `automation` applies to an event with `payload`.
pub fn evaluate(automation: &Automation, payload: &EventPayload) -> RuleEvaluation {
    match TriggerConditions::from_column(automation.trigger_conditions.as_ref()) {
        Ok(None) => RuleEvaluation::Matched,
        Ok(Some(conditions)) if conditions_match(&conditions, payload) => RuleEvaluation::Matched,
        Ok(Some(_)) => RuleEvaluation::NotMatched,
        Err(e) => RuleEvaluation::Misconfigured(format!("Invalid trigger conditions: {}", e)),
    }
}

fn conditions_match(conditions: &TriggerConditions, payload: &EventPayload) -> bool {
    // A constrained key must be present in the payload with the same value.
    fn check<T: PartialEq>(expected: &Option<T>, actual: &Option<T>) -> bool {
        match expected {
            None => true,
            Some(expected) => actual.as_ref() == Some(expected),
        }
    }

    check(&conditions.task_id, &payload.task_id)
        && check(&conditions.project_id, &payload.project_id)
        && check(&conditions.section_id, &payload.section_id)
        && check(&conditions.previous_section_id, &payload.previous_section_id)
        && check(&conditions.status, &payload.status)
        && check(&conditions.previous_status, &payload.previous_status)
        && check(&conditions.priority, &payload.priority)
        && check(&conditions.previous_priority, &payload.previous_priority)
        && check(&conditions.assignee_id, &payload.assignee_id)
        && check(&conditions.provider, &payload.provider)
        && check(&conditions.event, &payload.event)
}

/// Fill `{task.title}`, `{task.id}` and `{project.id}` from the event.
fn render(template: &str, event: &DomainEvent) -> String {
    let id = |value: Option<i32>| value.map(|v| v.to_string()).unwrap_or_default();
    template
        .replace(
            "{task.title}",
            event.payload.task_title.as_deref().unwrap_or_default(),
        )
        .replace("{task.id}", &id(event.task_id()))
        .replace("{project.id}", &id(event.project_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ActionType, MemberRole, NewAutomation, NewProject, NewProjectMember, NewSection, NewUser,
        Task, User,
    };
    use crate::realtime::NotificationHub;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        repos: Repositories,
        engine: AutomationEngine,
        outbox: UnboundedReceiver<OutgoingEmail>,
        user: User,
        project_id: i32,
    }

    fn fixture() -> Fixture {
        let repos = Repositories::in_memory();
        let hub = Arc::new(NotificationHub::new());
        let notifications = Arc::new(NotificationService::new(repos.notifications.clone(), hub));
        let (email, outbox) = EmailOutbox::channel();
        let engine = AutomationEngine::new(repos.clone(), notifications, email);

        let user = add_user(&repos, "owner@example.com");
        let project_id = add_project(&repos, "Launch", user.id);

        Fixture {
            repos,
            engine,
            outbox,
            user,
            project_id,
        }
    }

    fn add_project(repos: &Repositories, name: &str, owner_id: i32) -> i32 {
        let project = repos
            .projects
            .insert_project(NewProject {
                name: name.to_string(),
                description: None,
                color: None,
                owner_id,
            })
            .unwrap();
        add_member(repos, project.id, owner_id, MemberRole::Owner);
        project.id
    }

    fn add_member(repos: &Repositories, project_id: i32, user_id: i32, role: MemberRole) {
        repos
            .projects
            .insert_member(NewProjectMember {
                project_id,
                user_id,
                role,
            })
            .unwrap();
    }

    fn add_user(repos: &Repositories, email: &str) -> User {
        repos
            .users
            .insert_user(NewUser {
                email: email.to_string(),
                name: email.to_string(),
                password_hash: "x".to_string(),
            })
            .unwrap()
    }

    impl Fixture {
        fn task(&self, priority: Priority, assignee_id: Option<i32>) -> Task {
            self.repos
                .tasks
                .insert_task(NewTask {
                    project_id: self.project_id,
                    section_id: None,
                    title: "Ship it".to_string(),
                    description: None,
                    status: TaskStatus::Todo,
                    priority,
                    assignee_id,
                    creator_id: self.user.id,
                    due_date: None,
                    position: 0,
                })
                .unwrap()
        }

        fn automation(
            &self,
            trigger: TriggerType,
            conditions: Option<JsonValue>,
            action_type: ActionType,
            params: JsonValue,
        ) -> Automation {
            self.automation_in(Some(self.project_id), trigger, conditions, action_type, params)
        }

        fn automation_in(
            &self,
            project_id: Option<i32>,
            trigger: TriggerType,
            conditions: Option<JsonValue>,
            action_type: ActionType,
            params: JsonValue,
        ) -> Automation {
            self.repos
                .automations
                .insert_automation(NewAutomation {
                    name: "rule".to_string(),
                    description: None,
                    trigger_type: trigger,
                    trigger_conditions: conditions,
                    action_type,
                    action_parameters: params,
                    is_active: true,
                    project_id,
                    created_by: self.user.id,
                })
                .unwrap()
        }

        fn logs(&self, automation_id: i32) -> Vec<crate::models::AutomationLog> {
            self.repos
                .automations
                .list_automation_logs(automation_id, 0, 100)
                .unwrap()
        }

        fn reload(&self, automation_id: i32) -> Automation {
            self.repos
                .automations
                .find_automation(automation_id)
                .unwrap()
                .unwrap()
        }
    }

    fn notify_params() -> JsonValue {
        json!({"title": "Heads up", "message": "Task {task.title} (#{task.id}) changed"})
    }

    #[test]
    fn test_null_conditions_match_unconditionally() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::SendNotification,
            notify_params(),
        );
        let task = f.task(Priority::Low, None);

        let results = f.engine.dispatch(&DomainEvent::for_task(
            TriggerType::TaskCreated,
            &task,
            Some(f.user.id),
        ));

        assert_eq!(results.len(), 1);
        let logs = f.logs(automation.id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Success);
        assert_eq!(logs[0].related_task_id, Some(task.id));
        assert_eq!(logs[0].triggered_by, Some(f.user.id));

        let reloaded = f.reload(automation.id);
        assert_eq!(reloaded.execution_count, 1);
        assert!(reloaded.last_executed_at.is_some());
    }

    #[test]
    fn test_priority_condition_filters_events() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::TaskCreated,
            Some(json!({"priority": "HIGH"})),
            ActionType::SendNotification,
            notify_params(),
        );

        let medium = f.task(Priority::Medium, None);
        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &medium, None));
        assert!(f.logs(automation.id).is_empty());
        assert_eq!(f.reload(automation.id).execution_count, 0);

        let high = f.task(Priority::High, None);
        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &high, None));
        let logs = f.logs(automation.id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Success);
    }

    #[test]
    fn test_absent_payload_field_does_not_match() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::TaskUpdated,
            Some(json!({"assigneeId": f.user.id})),
            ActionType::SendNotification,
            notify_params(),
        );
        let task = f.task(Priority::Low, None);

        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskUpdated, &task, None));

        assert!(f.logs(automation.id).is_empty());
    }

    #[test]
    fn test_failing_action_records_failed_log() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::MoveTask,
            json!({"sectionId": 99_999}),
        );
        let task = f.task(Priority::Low, None);

        let results = f
            .engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, LogStatus::Failed);
        let logs = f.logs(automation.id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Failed);
        assert_eq!(logs[0].error_message.as_deref(), Some("section not found"));
        assert_eq!(f.reload(automation.id).execution_count, 1);
    }

    #[test]
    fn test_malformed_conditions_are_skipped_and_logged() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::TaskCreated,
            Some(json!({"colour": "red"})),
            ActionType::SendNotification,
            notify_params(),
        );
        let task = f.task(Priority::Low, None);

        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        let logs = f.logs(automation.id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Skipped);
        assert!(
            logs[0]
                .error_message
                .as_deref()
                .unwrap()
                .starts_with("Invalid trigger conditions")
        );
        assert_eq!(f.reload(automation.id).execution_count, 0);
    }

    #[test]
    fn test_global_automations_apply_to_every_project() {
        let f = fixture();
        let global = f.automation_in(
            None,
            TriggerType::TaskCreated,
            None,
            ActionType::SendNotification,
            notify_params(),
        );
        let other_project = add_project(&f.repos, "Other", f.user.id);
        let scoped_elsewhere = f.automation_in(
            Some(other_project),
            TriggerType::TaskCreated,
            None,
            ActionType::SendNotification,
            notify_params(),
        );
        let task = f.task(Priority::Low, None);

        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        assert_eq!(f.logs(global.id).len(), 1);
        assert!(f.logs(scoped_elsewhere.id).is_empty());
    }

    #[test]
    fn test_global_automation_ignores_projects_its_creator_is_not_in() {
        let mut f = fixture();
        let outsider = add_user(&f.repos, "outsider@example.com");
        let foreign = f
            .repos
            .automations
            .insert_automation(NewAutomation {
                name: "copy titles".to_string(),
                description: None,
                trigger_type: TriggerType::TaskCreated,
                trigger_conditions: None,
                action_type: ActionType::SendEmail,
                action_parameters: json!({
                    "to": "outsider@example.com",
                    "subject": "New task",
                    "body": "{task.title}"
                }),
                is_active: true,
                project_id: None,
                created_by: outsider.id,
            })
            .unwrap();
        let task = f.task(Priority::Low, None);

        let results = f
            .engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        assert!(results.is_empty());
        assert!(f.logs(foreign.id).is_empty());
        assert_eq!(f.reload(foreign.id).execution_count, 0);
        assert!(f.outbox.try_recv().is_err());

        add_member(&f.repos, f.project_id, outsider.id, MemberRole::Viewer);
        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));
        assert_eq!(f.logs(foreign.id).len(), 1);
        assert_eq!(f.outbox.try_recv().unwrap().body, "Ship it");
    }

    #[test]
    fn test_inactive_and_other_trigger_automations_do_not_run() {
        let f = fixture();
        let inactive = f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::SendNotification,
            notify_params(),
        );
        f.repos
            .automations
            .update_automation(
                inactive.id,
                crate::models::AutomationChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        let other_trigger = f.automation(
            TriggerType::TaskMoved,
            None,
            ActionType::SendNotification,
            notify_params(),
        );
        let task = f.task(Priority::Low, None);

        let results = f
            .engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        assert!(results.is_empty());
        assert!(f.logs(inactive.id).is_empty());
        assert!(f.logs(other_trigger.id).is_empty());
    }

    #[test]
    fn test_same_event_twice_runs_twice() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::SendNotification,
            notify_params(),
        );
        let task = f.task(Priority::Low, None);
        let event = DomainEvent::for_task(TriggerType::TaskCreated, &task, None);

        f.engine.dispatch(&event);
        f.engine.dispatch(&event);

        assert_eq!(f.logs(automation.id).len(), 2);
        assert_eq!(f.reload(automation.id).execution_count, 2);
    }

    #[test]
    fn test_send_notification_recipient_fallbacks() {
        let f = fixture();
        let assignee = add_user(&f.repos, "assignee@example.com");
        f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::SendNotification,
            notify_params(),
        );

        let assigned = f.task(Priority::Low, Some(assignee.id));
        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &assigned, None));
        let (to_assignee, _) = f
            .repos
            .notifications
            .list_notifications(assignee.id, false, 0, 10)
            .unwrap();
        assert_eq!(to_assignee.len(), 1);
        assert_eq!(to_assignee[0].kind, NotificationType::Automation);
        assert_eq!(
            to_assignee[0].message,
            format!("Task Ship it (#{}) changed", assigned.id)
        );

        let unassigned = f.task(Priority::Low, None);
        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &unassigned, None));
        let (to_creator, _) = f
            .repos
            .notifications
            .list_notifications(f.user.id, false, 0, 10)
            .unwrap();
        assert_eq!(to_creator.len(), 1);
    }

    #[test]
    fn test_send_email_is_rendered_and_queued() {
        let mut f = fixture();
        f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::SendEmail,
            json!({
                "to": "lead@example.com",
                "subject": "New task in project {project.id}",
                "body": "{task.title} was created",
            }),
        );
        let task = f.task(Priority::Low, None);

        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        let email = f.outbox.try_recv().unwrap();
        assert_eq!(email.to, "lead@example.com");
        assert_eq!(email.subject, format!("New task in project {}", f.project_id));
        assert_eq!(email.body, "Ship it was created");
    }

    #[test]
    fn test_assign_task_sets_assignee_and_notifies() {
        let f = fixture();
        let assignee = add_user(&f.repos, "dev@example.com");
        add_member(&f.repos, f.project_id, assignee.id, MemberRole::Member);
        f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::AssignTask,
            json!({"assigneeId": assignee.id}),
        );
        let task = f.task(Priority::Low, None);

        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        let updated = f.repos.tasks.find_task(task.id).unwrap().unwrap();
        assert_eq!(updated.assignee_id, Some(assignee.id));
        assert_eq!(f.repos.notifications.count_unread(assignee.id).unwrap(), 1);
    }

    #[test]
    fn test_assign_task_to_non_member_fails() {
        let f = fixture();
        let stranger = add_user(&f.repos, "stranger@example.com");
        let automation = f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::AssignTask,
            json!({"assigneeId": stranger.id}),
        );
        let task = f.task(Priority::Low, None);

        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        let logs = f.logs(automation.id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Failed);
        assert_eq!(
            f.repos.tasks.find_task(task.id).unwrap().unwrap().assignee_id,
            None
        );
        assert_eq!(f.repos.notifications.count_unread(stranger.id).unwrap(), 0);
    }

    #[test]
    fn test_move_and_update_priority_actions() {
        let f = fixture();
        let done = f
            .repos
            .sections
            .insert_section(NewSection {
                project_id: f.project_id,
                name: "Done".to_string(),
                position: 0,
            })
            .unwrap();
        f.automation(
            TriggerType::StatusChanged,
            Some(json!({"status": "DONE"})),
            ActionType::MoveTask,
            json!({"sectionId": done.id}),
        );
        f.automation(
            TriggerType::StatusChanged,
            Some(json!({"status": "DONE"})),
            ActionType::UpdatePriority,
            json!({"priority": "LOW"}),
        );
        let task = f.task(Priority::Urgent, None);
        let mut event = DomainEvent::for_task(TriggerType::StatusChanged, &task, None);
        event.payload.status = Some(TaskStatus::Done);
        event.payload.previous_status = Some(TaskStatus::Todo);

        let results = f.engine.dispatch(&event);

        assert!(results.iter().all(|r| r.status == LogStatus::Success));
        let updated = f.repos.tasks.find_task(task.id).unwrap().unwrap();
        assert_eq!(updated.section_id, Some(done.id));
        assert_eq!(updated.priority, Priority::Low);
    }

    #[test]
    fn test_create_task_does_not_cascade() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::TaskCreated,
            None,
            ActionType::CreateTask,
            json!({"title": "Review {task.title}", "priority": "HIGH"}),
        );
        let task = f.task(Priority::Low, None);

        f.engine
            .dispatch(&DomainEvent::for_task(TriggerType::TaskCreated, &task, None));

        let tasks = f.repos.tasks.list_tasks(f.project_id, None).unwrap();
        assert_eq!(tasks.len(), 2);
        let created = tasks.iter().find(|t| t.id != task.id).unwrap();
        assert_eq!(created.title, "Review Ship it");
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.creator_id, f.user.id);
        // The created task did not itself trigger the automation again.
        assert_eq!(f.logs(automation.id).len(), 1);
    }

    #[test]
    fn test_task_action_without_task_fails() {
        let f = fixture();
        let automation = f.automation(
            TriggerType::ProjectCreated,
            None,
            ActionType::UpdatePriority,
            json!({"priority": "HIGH"}),
        );

        f.engine.dispatch(&DomainEvent::new(
            TriggerType::ProjectCreated,
            Some(f.project_id),
            Some(f.user.id),
        ));

        let logs = f.logs(automation.id);
        assert_eq!(logs[0].status, LogStatus::Failed);
        assert_eq!(
            logs[0].error_message.as_deref(),
            Some("PROJECT_CREATED event carries no task")
        );
    }

    #[test]
    fn test_previous_section_condition() {
        let now = Utc::now().naive_utc();
        let automation = Automation {
            id: 1,
            name: "moved out of backlog".to_string(),
            description: None,
            trigger_type: TriggerType::TaskMoved,
            trigger_conditions: Some(json!({"previousSectionId": 3})),
            action_type: ActionType::SendNotification,
            action_parameters: notify_params(),
            is_active: true,
            project_id: None,
            created_by: 1,
            execution_count: 0,
            last_executed_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut payload = EventPayload {
            previous_section_id: Some(3),
            section_id: Some(4),
            ..Default::default()
        };
        assert_eq!(evaluate(&automation, &payload), RuleEvaluation::Matched);

        payload.previous_section_id = Some(5);
        assert_eq!(evaluate(&automation, &payload), RuleEvaluation::NotMatched);
    }
}

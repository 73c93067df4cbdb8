//! In-process store. Mirrors the constraints the SQL schema enforces
//! (unique emails, foreign keys, cascades) so services behave the same way
//! against it as against PostgreSQL.

use super::{
    AutomationRepository, CommentRepository, IntegrationRepository, NotificationRepository,
    ProjectRepository, ReportRepository, SectionRepository, StoreHealth, TaskRepository,
    UserRepository,
};
use crate::error::{RepoError, RepoResult};
use crate::models::{
    Automation, AutomationChanges, AutomationLog, Comment, Integration, NewAutomation,
    NewAutomationLog, NewComment, NewIntegration, NewNotification, NewProject, NewProjectMember,
    NewReport, NewSection, NewTask, NewUser, Notification, NotificationPreferences, Project,
    ProjectChanges, ProjectMember, Report, ReportChanges, Section, SectionChanges, Task,
    TaskChanges, TaskStatus, TriggerType, User,
};
use chrono::{NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    next_id: i32,
    users: BTreeMap<i32, User>,
    projects: BTreeMap<i32, Project>,
    members: Vec<ProjectMember>,
    sections: BTreeMap<i32, Section>,
    tasks: BTreeMap<i32, Task>,
    comments: BTreeMap<i32, Comment>,
    notifications: BTreeMap<i32, Notification>,
    preferences: HashMap<i32, NotificationPreferences>,
    automations: BTreeMap<i32, Automation>,
    automation_logs: BTreeMap<i32, AutomationLog>,
    reports: BTreeMap<i32, Report>,
    integrations: BTreeMap<i32, Integration>,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn require_user(&self, id: i32) -> RepoResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::NotFound("user"))
        }
    }

    fn require_project(&self, id: i32) -> RepoResult<()> {
        if self.projects.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::NotFound("project"))
        }
    }

    fn require_section(&self, id: i32) -> RepoResult<()> {
        if self.sections.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::NotFound("section"))
        }
    }

    fn remove_task_cascade(&mut self, task_id: i32) {
        self.tasks.remove(&task_id);
        self.comments.retain(|_, c| c.task_id != task_id);
        for n in self.notifications.values_mut() {
            if n.related_task_id == Some(task_id) {
                n.related_task_id = None;
            }
        }
    }

    fn remove_automation_cascade(&mut self, automation_id: i32) {
        self.automations.remove(&automation_id);
        self.automation_logs
            .retain(|_, l| l.automation_id != automation_id);
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn window<T: Clone>(items: &[T], offset: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreHealth for MemoryStore {
    fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

impl UserRepository for MemoryStore {
    fn insert_user(&self, user: NewUser) -> RepoResult<User> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict(format!(
                "duplicate key value violates unique constraint \"users_email_key\" ({})",
                user.email
            )));
        }
        let ts = now();
        let id = inner.next_id();
        let row = User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: ts,
            updated_at: ts,
        };
        inner.users.insert(id, row.clone());
        Ok(row)
    }

    fn find_user(&self, id: i32) -> RepoResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

impl ProjectRepository for MemoryStore {
    fn insert_project(&self, project: NewProject) -> RepoResult<Project> {
        let mut inner = self.lock();
        inner.require_user(project.owner_id)?;
        let ts = now();
        let id = inner.next_id();
        let row = Project {
            id,
            name: project.name,
            description: project.description,
            color: project.color,
            owner_id: project.owner_id,
            created_at: ts,
            updated_at: ts,
        };
        inner.projects.insert(id, row.clone());
        Ok(row)
    }

    fn find_project(&self, id: i32) -> RepoResult<Option<Project>> {
        Ok(self.lock().projects.get(&id).cloned())
    }

    fn list_projects_for_user(&self, user_id: i32) -> RepoResult<Vec<Project>> {
        let inner = self.lock();
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| {
                inner
                    .members
                    .iter()
                    .any(|m| m.project_id == p.id && m.user_id == user_id)
            })
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(projects)
    }

    fn page_projects_for_user(
        &self,
        user_id: i32,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Project>, i64)> {
        let all = self.list_projects_for_user(user_id)?;
        let total = all.len() as i64;
        Ok((window(&all, offset, limit), total))
    }

    fn update_project(&self, id: i32, changes: ProjectChanges) -> RepoResult<Project> {
        let mut inner = self.lock();
        let project = inner
            .projects
            .get_mut(&id)
            .ok_or(RepoError::NotFound("project"))?;
        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(color) = changes.color {
            project.color = color;
        }
        project.updated_at = now();
        Ok(project.clone())
    }

    fn delete_project(&self, id: i32) -> RepoResult<()> {
        let mut inner = self.lock();
        if inner.projects.remove(&id).is_none() {
            return Err(RepoError::NotFound("project"));
        }
        inner.members.retain(|m| m.project_id != id);
        inner.sections.retain(|_, s| s.project_id != id);
        let task_ids: Vec<i32> = inner
            .tasks
            .values()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            inner.remove_task_cascade(task_id);
        }
        let automation_ids: Vec<i32> = inner
            .automations
            .values()
            .filter(|a| a.project_id == Some(id))
            .map(|a| a.id)
            .collect();
        for automation_id in automation_ids {
            inner.remove_automation_cascade(automation_id);
        }
        inner.reports.retain(|_, r| r.project_id != id);
        inner.integrations.retain(|_, i| i.project_id != id);
        for n in inner.notifications.values_mut() {
            if n.related_project_id == Some(id) {
                n.related_project_id = None;
            }
        }
        Ok(())
    }

    fn insert_member(&self, member: NewProjectMember) -> RepoResult<ProjectMember> {
        let mut inner = self.lock();
        inner.require_project(member.project_id)?;
        inner.require_user(member.user_id)?;
        if inner
            .members
            .iter()
            .any(|m| m.project_id == member.project_id && m.user_id == member.user_id)
        {
            return Err(RepoError::Conflict(
                "user is already a member of this project".to_string(),
            ));
        }
        let row = ProjectMember {
            project_id: member.project_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: now(),
        };
        inner.members.push(row.clone());
        Ok(row)
    }

    fn find_member(&self, project_id: i32, user_id: i32) -> RepoResult<Option<ProjectMember>> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    fn list_members(&self, project_id: i32) -> RepoResult<Vec<ProjectMember>> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    fn delete_member(&self, project_id: i32, user_id: i32) -> RepoResult<()> {
        let mut inner = self.lock();
        let before = inner.members.len();
        inner
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        if inner.members.len() == before {
            return Err(RepoError::NotFound("member"));
        }
        Ok(())
    }
}

impl SectionRepository for MemoryStore {
    fn insert_section(&self, section: NewSection) -> RepoResult<Section> {
        let mut inner = self.lock();
        inner.require_project(section.project_id)?;
        let ts = now();
        let id = inner.next_id();
        let row = Section {
            id,
            project_id: section.project_id,
            name: section.name,
            position: section.position,
            created_at: ts,
            updated_at: ts,
        };
        inner.sections.insert(id, row.clone());
        Ok(row)
    }

    fn find_section(&self, id: i32) -> RepoResult<Option<Section>> {
        Ok(self.lock().sections.get(&id).cloned())
    }

    fn list_sections(&self, project_id: i32) -> RepoResult<Vec<Section>> {
        let mut sections: Vec<Section> = self
            .lock()
            .sections
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| (s.position, s.id));
        Ok(sections)
    }

    fn update_section(&self, id: i32, changes: SectionChanges) -> RepoResult<Section> {
        let mut inner = self.lock();
        let section = inner
            .sections
            .get_mut(&id)
            .ok_or(RepoError::NotFound("section"))?;
        if let Some(name) = changes.name {
            section.name = name;
        }
        if let Some(position) = changes.position {
            section.position = position;
        }
        section.updated_at = now();
        Ok(section.clone())
    }

    fn delete_section(&self, id: i32) -> RepoResult<()> {
        let mut inner = self.lock();
        if inner.sections.remove(&id).is_none() {
            return Err(RepoError::NotFound("section"));
        }
        for task in inner.tasks.values_mut() {
            if task.section_id == Some(id) {
                task.section_id = None;
            }
        }
        Ok(())
    }
}

impl TaskRepository for MemoryStore {
    fn insert_task(&self, task: NewTask) -> RepoResult<Task> {
        let mut inner = self.lock();
        inner.require_project(task.project_id)?;
        inner.require_user(task.creator_id)?;
        if let Some(section_id) = task.section_id {
            inner.require_section(section_id)?;
        }
        if let Some(assignee_id) = task.assignee_id {
            inner.require_user(assignee_id)?;
        }
        let ts = now();
        let id = inner.next_id();
        let row = Task {
            id,
            project_id: task.project_id,
            section_id: task.section_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            assignee_id: task.assignee_id,
            creator_id: task.creator_id,
            due_date: task.due_date,
            position: task.position,
            completed_at: None,
            reminder_sent_at: None,
            created_at: ts,
            updated_at: ts,
        };
        inner.tasks.insert(id, row.clone());
        Ok(row)
    }

    fn find_task(&self, id: i32) -> RepoResult<Option<Task>> {
        Ok(self.lock().tasks.get(&id).cloned())
    }

    fn list_tasks(&self, project_id: i32, section_id: Option<i32>) -> RepoResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .lock()
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .filter(|t| section_id.is_none() || t.section_id == section_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.position, t.id));
        Ok(tasks)
    }

    fn list_tasks_due_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<Vec<Task>> {
        Ok(self
            .lock()
            .tasks
            .values()
            .filter(|t| t.status != TaskStatus::Done && t.reminder_sent_at.is_none())
            .filter(|t| t.due_date.is_some_and(|due| due >= from && due < to))
            .cloned()
            .collect())
    }

    fn next_task_position(&self, project_id: i32, section_id: Option<i32>) -> RepoResult<i32> {
        Ok(self
            .lock()
            .tasks
            .values()
            .filter(|t| t.project_id == project_id && t.section_id == section_id)
            .map(|t| t.position + 1)
            .max()
            .unwrap_or(0))
    }

    fn update_task(&self, id: i32, changes: TaskChanges) -> RepoResult<Task> {
        let mut inner = self.lock();
        if let Some(Some(section_id)) = changes.section_id {
            inner.require_section(section_id)?;
        }
        if let Some(Some(assignee_id)) = changes.assignee_id {
            inner.require_user(assignee_id)?;
        }
        let task = inner
            .tasks
            .get_mut(&id)
            .ok_or(RepoError::NotFound("task"))?;
        if let Some(section_id) = changes.section_id {
            task.section_id = section_id;
        }
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = changes.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        if let Some(position) = changes.position {
            task.position = position;
        }
        if let Some(completed_at) = changes.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(reminder_sent_at) = changes.reminder_sent_at {
            task.reminder_sent_at = reminder_sent_at;
        }
        task.updated_at = now();
        Ok(task.clone())
    }

    fn delete_task(&self, id: i32) -> RepoResult<()> {
        let mut inner = self.lock();
        if !inner.tasks.contains_key(&id) {
            return Err(RepoError::NotFound("task"));
        }
        inner.remove_task_cascade(id);
        Ok(())
    }
}

impl CommentRepository for MemoryStore {
    fn insert_comment(&self, comment: NewComment) -> RepoResult<Comment> {
        let mut inner = self.lock();
        if !inner.tasks.contains_key(&comment.task_id) {
            return Err(RepoError::NotFound("task"));
        }
        inner.require_user(comment.author_id)?;
        let id = inner.next_id();
        let row = Comment {
            id,
            task_id: comment.task_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: now(),
        };
        inner.comments.insert(id, row.clone());
        Ok(row)
    }

    fn find_comment(&self, id: i32) -> RepoResult<Option<Comment>> {
        Ok(self.lock().comments.get(&id).cloned())
    }

    fn list_comments(&self, task_id: i32) -> RepoResult<Vec<Comment>> {
        Ok(self
            .lock()
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    fn delete_comment(&self, id: i32) -> RepoResult<()> {
        self.lock()
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound("comment"))
    }
}

impl NotificationRepository for MemoryStore {
    fn insert_notification(&self, notification: NewNotification) -> RepoResult<Notification> {
        let mut inner = self.lock();
        inner.require_user(notification.user_id)?;
        let id = inner.next_id();
        let row = Notification {
            id,
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            is_read: false,
            related_task_id: notification.related_task_id,
            related_project_id: notification.related_project_id,
            created_at: now(),
        };
        inner.notifications.insert(id, row.clone());
        Ok(row)
    }

    fn list_notifications(
        &self,
        user_id: i32,
        unread_only: bool,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Notification>, i64)> {
        let inner = self.lock();
        let matching: Vec<Notification> = inner
            .notifications
            .values()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        Ok((window(&matching, offset, limit), total))
    }

    fn mark_notification_read(&self, id: i32, user_id: i32) -> RepoResult<Option<Notification>> {
        let mut inner = self.lock();
        Ok(inner
            .notifications
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    fn mark_all_notifications_read(&self, user_id: i32) -> RepoResult<usize> {
        let mut inner = self.lock();
        let mut updated = 0;
        for n in inner.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn count_unread(&self, user_id: i32) -> RepoResult<i64> {
        Ok(self
            .lock()
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    fn find_preferences(&self, user_id: i32) -> RepoResult<Option<NotificationPreferences>> {
        Ok(self.lock().preferences.get(&user_id).cloned())
    }

    fn save_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> RepoResult<NotificationPreferences> {
        let mut inner = self.lock();
        inner.require_user(preferences.user_id)?;
        let mut row = preferences;
        row.updated_at = now();
        inner.preferences.insert(row.user_id, row.clone());
        Ok(row)
    }
}

impl AutomationRepository for MemoryStore {
    fn insert_automation(&self, automation: NewAutomation) -> RepoResult<Automation> {
        let mut inner = self.lock();
        if let Some(project_id) = automation.project_id {
            inner.require_project(project_id)?;
        }
        inner.require_user(automation.created_by)?;
        let ts = now();
        let id = inner.next_id();
        let row = Automation {
            id,
            name: automation.name,
            description: automation.description,
            trigger_type: automation.trigger_type,
            trigger_conditions: automation.trigger_conditions,
            action_type: automation.action_type,
            action_parameters: automation.action_parameters,
            is_active: automation.is_active,
            project_id: automation.project_id,
            created_by: automation.created_by,
            execution_count: 0,
            last_executed_at: None,
            created_at: ts,
            updated_at: ts,
        };
        inner.automations.insert(id, row.clone());
        Ok(row)
    }

    fn find_automation(&self, id: i32) -> RepoResult<Option<Automation>> {
        Ok(self.lock().automations.get(&id).cloned())
    }

    fn list_automations(&self, project_id: Option<i32>) -> RepoResult<Vec<Automation>> {
        Ok(self
            .lock()
            .automations
            .values()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    fn list_active_automations(
        &self,
        trigger: TriggerType,
        project_id: Option<i32>,
    ) -> RepoResult<Vec<Automation>> {
        Ok(self
            .lock()
            .automations
            .values()
            .filter(|a| a.is_active && a.trigger_type == trigger)
            .filter(|a| a.project_id.is_none() || a.project_id == project_id)
            .cloned()
            .collect())
    }

    fn update_automation(&self, id: i32, changes: AutomationChanges) -> RepoResult<Automation> {
        let mut inner = self.lock();
        let automation = inner
            .automations
            .get_mut(&id)
            .ok_or(RepoError::NotFound("automation"))?;
        if let Some(name) = changes.name {
            automation.name = name;
        }
        if let Some(description) = changes.description {
            automation.description = description;
        }
        if let Some(trigger_type) = changes.trigger_type {
            automation.trigger_type = trigger_type;
        }
        if let Some(trigger_conditions) = changes.trigger_conditions {
            automation.trigger_conditions = trigger_conditions;
        }
        if let Some(action_type) = changes.action_type {
            automation.action_type = action_type;
        }
        if let Some(action_parameters) = changes.action_parameters {
            automation.action_parameters = action_parameters;
        }
        if let Some(is_active) = changes.is_active {
            automation.is_active = is_active;
        }
        automation.updated_at = now();
        Ok(automation.clone())
    }

    fn delete_automation(&self, id: i32) -> RepoResult<()> {
        let mut inner = self.lock();
        if !inner.automations.contains_key(&id) {
            return Err(RepoError::NotFound("automation"));
        }
        inner.remove_automation_cascade(id);
        Ok(())
    }

    fn record_automation_run(&self, id: i32, at: NaiveDateTime) -> RepoResult<()> {
        let mut inner = self.lock();
        let automation = inner
            .automations
            .get_mut(&id)
            .ok_or(RepoError::NotFound("automation"))?;
        automation.execution_count += 1;
        automation.last_executed_at = Some(at);
        Ok(())
    }

    fn insert_automation_log(&self, log: NewAutomationLog) -> RepoResult<AutomationLog> {
        let mut inner = self.lock();
        if !inner.automations.contains_key(&log.automation_id) {
            return Err(RepoError::NotFound("automation"));
        }
        let id = inner.next_id();
        let row = AutomationLog {
            id,
            automation_id: log.automation_id,
            status: log.status,
            trigger_data: log.trigger_data,
            action_result: log.action_result,
            error_message: log.error_message,
            execution_time_ms: log.execution_time_ms,
            related_task_id: log.related_task_id,
            triggered_by: log.triggered_by,
            executed_at: now(),
        };
        inner.automation_logs.insert(id, row.clone());
        Ok(row)
    }

    fn list_automation_logs(
        &self,
        automation_id: i32,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<AutomationLog>> {
        let logs: Vec<AutomationLog> = self
            .lock()
            .automation_logs
            .values()
            .rev()
            .filter(|l| l.automation_id == automation_id)
            .cloned()
            .collect();
        Ok(window(&logs, offset, limit))
    }
}

impl ReportRepository for MemoryStore {
    fn insert_report(&self, report: NewReport) -> RepoResult<Report> {
        let mut inner = self.lock();
        inner.require_project(report.project_id)?;
        let ts = now();
        let id = inner.next_id();
        let row = Report {
            id,
            project_id: report.project_id,
            name: report.name,
            description: report.description,
            fields: report.fields,
            filters: report.filters,
            visualization: report.visualization,
            created_by: report.created_by,
            created_at: ts,
            updated_at: ts,
        };
        inner.reports.insert(id, row.clone());
        Ok(row)
    }

    fn find_report(&self, id: i32) -> RepoResult<Option<Report>> {
        Ok(self.lock().reports.get(&id).cloned())
    }

    fn list_reports(&self, project_id: i32) -> RepoResult<Vec<Report>> {
        Ok(self
            .lock()
            .reports
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    fn update_report(&self, id: i32, changes: ReportChanges) -> RepoResult<Report> {
        let mut inner = self.lock();
        let report = inner
            .reports
            .get_mut(&id)
            .ok_or(RepoError::NotFound("report"))?;
        if let Some(name) = changes.name {
            report.name = name;
        }
        if let Some(description) = changes.description {
            report.description = description;
        }
        if let Some(fields) = changes.fields {
            report.fields = fields;
        }
        if let Some(filters) = changes.filters {
            report.filters = filters;
        }
        if let Some(visualization) = changes.visualization {
            report.visualization = visualization;
        }
        report.updated_at = now();
        Ok(report.clone())
    }

    fn delete_report(&self, id: i32) -> RepoResult<()> {
        self.lock()
            .reports
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound("report"))
    }
}

impl IntegrationRepository for MemoryStore {
    fn insert_integration(&self, integration: NewIntegration) -> RepoResult<Integration> {
        let mut inner = self.lock();
        inner.require_project(integration.project_id)?;
        let id = inner.next_id();
        let row = Integration {
            id,
            project_id: integration.project_id,
            provider: integration.provider,
            name: integration.name,
            secret: integration.secret,
            is_active: true,
            created_by: integration.created_by,
            created_at: now(),
        };
        inner.integrations.insert(id, row.clone());
        Ok(row)
    }

    fn find_integration(&self, id: i32) -> RepoResult<Option<Integration>> {
        Ok(self.lock().integrations.get(&id).cloned())
    }

    fn list_integrations(&self, project_id: i32) -> RepoResult<Vec<Integration>> {
        Ok(self
            .lock()
            .integrations
            .values()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect())
    }

    fn delete_integration(&self, id: i32) -> RepoResult<()> {
        self.lock()
            .integrations
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound("integration"))
    }
}

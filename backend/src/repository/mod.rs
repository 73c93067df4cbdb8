//! Persistence contracts, one trait per aggregate.
//!
//! `PgStore` implements them over diesel/PostgreSQL; `MemoryStore` keeps
//! everything in process and backs the test-suite and `IN_MEMORY=true` runs.

use crate::error::RepoResult;
use crate::models::{
    Automation, AutomationChanges, AutomationLog, Comment, Integration, NewAutomation,
    NewAutomationLog, NewComment, NewIntegration, NewNotification, NewProject, NewProjectMember,
    NewReport, NewSection, NewTask, NewUser, Notification, NotificationPreferences, Project,
    ProjectChanges, ProjectMember, Report, ReportChanges, Section, SectionChanges, Task,
    TaskChanges, TriggerType, User,
};
use chrono::NaiveDateTime;
use std::sync::Arc;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub trait UserRepository: Send + Sync {
    fn insert_user(&self, user: NewUser) -> RepoResult<User>;
    fn find_user(&self, id: i32) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

pub trait ProjectRepository: Send + Sync {
    fn insert_project(&self, project: NewProject) -> RepoResult<Project>;
    fn find_project(&self, id: i32) -> RepoResult<Option<Project>>;
    /// Projects the user is a member of, newest first.
    fn list_projects_for_user(&self, user_id: i32) -> RepoResult<Vec<Project>>;
    /// One window of `list_projects_for_user` plus the total count.
    fn page_projects_for_user(
        &self,
        user_id: i32,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Project>, i64)>;
    fn update_project(&self, id: i32, changes: ProjectChanges) -> RepoResult<Project>;
    /// Removes the project and everything owned by it.
    fn delete_project(&self, id: i32) -> RepoResult<()>;

    fn insert_member(&self, member: NewProjectMember) -> RepoResult<ProjectMember>;
    fn find_member(&self, project_id: i32, user_id: i32) -> RepoResult<Option<ProjectMember>>;
    fn list_members(&self, project_id: i32) -> RepoResult<Vec<ProjectMember>>;
    fn delete_member(&self, project_id: i32, user_id: i32) -> RepoResult<()>;
}

pub trait SectionRepository: Send + Sync {
    fn insert_section(&self, section: NewSection) -> RepoResult<Section>;
    fn find_section(&self, id: i32) -> RepoResult<Option<Section>>;
    /// Sections of a project ordered by position.
    fn list_sections(&self, project_id: i32) -> RepoResult<Vec<Section>>;
    fn update_section(&self, id: i32, changes: SectionChanges) -> RepoResult<Section>;
    /// Deletes the section; its tasks are kept with no section.
    fn delete_section(&self, id: i32) -> RepoResult<()>;
}

pub trait TaskRepository: Send + Sync {
    fn insert_task(&self, task: NewTask) -> RepoResult<Task>;
    fn find_task(&self, id: i32) -> RepoResult<Option<Task>>;
    /// Tasks of a project (optionally one section) ordered by position.
    fn list_tasks(&self, project_id: i32, section_id: Option<i32>) -> RepoResult<Vec<Task>>;
    /// Unfinished tasks due in `[from, to)` that have not been reminded yet.
    fn list_tasks_due_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<Vec<Task>>;
    /// Next free position at the end of a project/section column.
    fn next_task_position(&self, project_id: i32, section_id: Option<i32>) -> RepoResult<i32>;
    fn update_task(&self, id: i32, changes: TaskChanges) -> RepoResult<Task>;
    fn delete_task(&self, id: i32) -> RepoResult<()>;
}

pub trait CommentRepository: Send + Sync {
    fn insert_comment(&self, comment: NewComment) -> RepoResult<Comment>;
    fn find_comment(&self, id: i32) -> RepoResult<Option<Comment>>;
    fn list_comments(&self, task_id: i32) -> RepoResult<Vec<Comment>>;
    fn delete_comment(&self, id: i32) -> RepoResult<()>;
}

pub trait NotificationRepository: Send + Sync {
    fn insert_notification(&self, notification: NewNotification) -> RepoResult<Notification>;
    /// Newest first.
    fn list_notifications(
        &self,
        user_id: i32,
        unread_only: bool,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Notification>, i64)>;
    /// Marks one notification read; `None` when it does not belong to the user.
    fn mark_notification_read(&self, id: i32, user_id: i32) -> RepoResult<Option<Notification>>;
    fn mark_all_notifications_read(&self, user_id: i32) -> RepoResult<usize>;
    fn count_unread(&self, user_id: i32) -> RepoResult<i64>;
    fn find_preferences(&self, user_id: i32) -> RepoResult<Option<NotificationPreferences>>;
    fn save_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> RepoResult<NotificationPreferences>;
}

pub trait AutomationRepository: Send + Sync {
    fn insert_automation(&self, automation: NewAutomation) -> RepoResult<Automation>;
    fn find_automation(&self, id: i32) -> RepoResult<Option<Automation>>;
    /// Automations of one project, or the global ones when `project_id` is `None`.
    fn list_automations(&self, project_id: Option<i32>) -> RepoResult<Vec<Automation>>;
    /// Active automations for `trigger` scoped to `project_id` plus global
    /// ones, in ascending id order.
    fn list_active_automations(
        &self,
        trigger: TriggerType,
        project_id: Option<i32>,
    ) -> RepoResult<Vec<Automation>>;
    fn update_automation(&self, id: i32, changes: AutomationChanges) -> RepoResult<Automation>;
    fn delete_automation(&self, id: i32) -> RepoResult<()>;
    /// Bumps `execution_count` and stamps `last_executed_at`.
    fn record_automation_run(&self, id: i32, at: NaiveDateTime) -> RepoResult<()>;

    fn insert_automation_log(&self, log: NewAutomationLog) -> RepoResult<AutomationLog>;
    /// Newest first.
    fn list_automation_logs(
        &self,
        automation_id: i32,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<AutomationLog>>;
}

pub trait ReportRepository: Send + Sync {
    fn insert_report(&self, report: NewReport) -> RepoResult<Report>;
    fn find_report(&self, id: i32) -> RepoResult<Option<Report>>;
    fn list_reports(&self, project_id: i32) -> RepoResult<Vec<Report>>;
    fn update_report(&self, id: i32, changes: ReportChanges) -> RepoResult<Report>;
    fn delete_report(&self, id: i32) -> RepoResult<()>;
}

pub trait IntegrationRepository: Send + Sync {
    fn insert_integration(&self, integration: NewIntegration) -> RepoResult<Integration>;
    fn find_integration(&self, id: i32) -> RepoResult<Option<Integration>>;
    fn list_integrations(&self, project_id: i32) -> RepoResult<Vec<Integration>>;
    fn delete_integration(&self, id: i32) -> RepoResult<()>;
}

/// Health probe for the `/ready` endpoint.
pub trait StoreHealth: Send + Sync {
    fn ping(&self) -> RepoResult<()>;
}

/// Shared handles to every repository, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub sections: Arc<dyn SectionRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub automations: Arc<dyn AutomationRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub integrations: Arc<dyn IntegrationRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + ProjectRepository
            + SectionRepository
            + TaskRepository
            + CommentRepository
            + NotificationRepository
            + AutomationRepository
            + ReportRepository
            + IntegrationRepository
            + StoreHealth
            + 'static,
    {
        Self {
            users: store.clone(),
            projects: store.clone(),
            sections: store.clone(),
            tasks: store.clone(),
            comments: store.clone(),
            notifications: store.clone(),
            automations: store.clone(),
            reports: store.clone(),
            integrations: store.clone(),
            health: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }
}

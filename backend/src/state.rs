use crate::config::AppConfig;
use crate::db;
use crate::realtime::NotificationHub;
use crate::repository::{MemoryStore, PgStore, Repositories};
use crate::services::{
    auth::{Argon2Hasher, AuthService, TokenIssuer},
    automation_engine::AutomationEngine,
    automations::AutomationService,
    comments::CommentService,
    dashboard::DashboardService,
    email::{EmailOutbox, OutgoingEmail},
    events::EventDispatcher,
    integrations::IntegrationService,
    notifications::NotificationService,
    projects::ProjectService,
    reminders::ReminderService,
    reports::ReportService,
    sections::SectionService,
    tasks::TaskService,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

/// Everything request handlers need, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub repos: Repositories,
    pub hub: Arc<NotificationHub>,
    pub tokens: TokenIssuer,
    pub auth: AuthService,
    pub notifications: Arc<NotificationService>,
    pub events: Arc<EventDispatcher>,
    pub projects: ProjectService,
    pub sections: SectionService,
    pub tasks: TaskService,
    pub comments: CommentService,
    pub automations: AutomationService,
    pub reports: ReportService,
    pub dashboard: DashboardService,
    pub integrations: IntegrationService,
    pub reminders: ReminderService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, repos: Repositories, email: EmailOutbox) -> Self {
        let hub = Arc::new(NotificationHub::new());
        let tokens = TokenIssuer::new(config.jwt_secret.clone(), config.jwt_ttl_hours);
        let notifications = Arc::new(NotificationService::new(
            repos.notifications.clone(),
            hub.clone(),
        ));
        let engine = Arc::new(AutomationEngine::new(
            repos.clone(),
            notifications.clone(),
            email,
        ));
        let events = Arc::new(EventDispatcher::new(engine, hub.clone()));

        Self {
            auth: AuthService::new(repos.users.clone(), Arc::new(Argon2Hasher), tokens.clone()),
            projects: ProjectService::new(repos.clone(), notifications.clone(), events.clone()),
            sections: SectionService::new(repos.clone()),
            tasks: TaskService::new(repos.clone(), notifications.clone(), events.clone()),
            comments: CommentService::new(repos.clone(), notifications.clone(), events.clone()),
            automations: AutomationService::new(repos.clone()),
            reports: ReportService::new(repos.clone()),
            dashboard: DashboardService::new(repos.clone()),
            integrations: IntegrationService::new(repos.clone(), events.clone()),
            reminders: ReminderService::new(repos.clone(), notifications.clone(), events.clone()),
            config,
            repos,
            hub,
            tokens,
            notifications,
            events,
            started_at: Instant::now(),
        }
    }

    /// Pick the store from `config` (PostgreSQL unless `IN_MEMORY`) and build
    /// the state, returning the email outbox receiver for the relay task.
    pub fn from_config(
        config: AppConfig,
    ) -> Result<(Self, UnboundedReceiver<OutgoingEmail>), Box<dyn Error + Send + Sync>> {
        let repos = match (&config.database_url, config.in_memory) {
            (Some(url), false) => {
                Repositories::from_store(Arc::new(PgStore::new(db::init_pool(url)?)))
            }
            _ => {
                log::warn!("Using the in-memory store; data is lost on restart");
                Repositories::from_store(Arc::new(MemoryStore::new()))
            }
        };
        let (email, outbox) = EmailOutbox::channel();
        Ok((Self::new(config, repos, email), outbox))
    }

    /// State over a fresh `MemoryStore`, returning the email outbox receiver.
    pub fn in_memory(config: AppConfig) -> (Self, UnboundedReceiver<OutgoingEmail>) {
        let (email, outbox) = EmailOutbox::channel();
        (Self::new(config, Repositories::in_memory(), email), outbox)
    }
}

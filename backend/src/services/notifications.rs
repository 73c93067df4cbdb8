use crate::error::{AppError, AppResult};
use crate::models::{
    MAX_PAGE_SIZE, NewNotification, Notification, NotificationPreferences, Page, page_window,
};
use crate::realtime::{NotificationHub, ServerEvent};
use crate::repository::NotificationRepository;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Partial preference update; absent flags keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub task_assigned: Option<bool>,
    pub task_updated: Option<bool>,
    pub task_completed: Option<bool>,
    pub comment_added: Option<bool>,
    pub project_invite: Option<bool>,
    pub due_date_reminder: Option<bool>,
    pub automation: Option<bool>,
    pub email_notifications: Option<bool>,
}

impl PreferencesUpdate {
    fn apply(self, prefs: &mut NotificationPreferences) {
        let flags = [
            (self.task_assigned, &mut prefs.task_assigned),
            (self.task_updated, &mut prefs.task_updated),
            (self.task_completed, &mut prefs.task_completed),
            (self.comment_added, &mut prefs.comment_added),
            (self.project_invite, &mut prefs.project_invite),
            (self.due_date_reminder, &mut prefs.due_date_reminder),
            (self.automation, &mut prefs.automation),
            (self.email_notifications, &mut prefs.email_notifications),
        ];
        for (update, flag) in flags {
            if let Some(value) = update {
                *flag = value;
            }
        }
    }
}

pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    hub: Arc<NotificationHub>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>, hub: Arc<NotificationHub>) -> Self {
        Self { repo, hub }
    }

    /// Persist a notification and push it to the recipient's open sockets.
    ///
    /// Returns `None` when the recipient has disabled this kind.
    pub fn notify(&self, notification: NewNotification) -> AppResult<Option<Notification>> {
        let prefs = self.preferences(notification.user_id)?;
        if !prefs.allows(notification.kind) {
            log::debug!(
                "User {} has {} notifications disabled",
                notification.user_id,
                notification.kind
            );
            return Ok(None);
        }

        let created = self.repo.insert_notification(notification)?;
        let pushed = self
            .hub
            .emit_to_user(created.user_id, &ServerEvent::Notification(created.clone()));
        log::debug!(
            "Notification {} for user {} pushed to {} client(s)",
            created.id,
            created.user_id,
            pushed
        );
        Ok(Some(created))
    }

    pub fn list(
        &self,
        user_id: i32,
        unread_only: bool,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<Page<Notification>> {
        let (offset, limit) = page_window(offset, limit);
        let (items, total) = self
            .repo
            .list_notifications(user_id, unread_only, offset, limit)?;
        Ok(Page::new(items, total, offset, limit))
    }

    /// Most recent unread notifications, sent to a socket on connect.
    pub fn unread(&self, user_id: i32) -> AppResult<Vec<Notification>> {
        let (items, _) = self
            .repo
            .list_notifications(user_id, true, 0, MAX_PAGE_SIZE)?;
        Ok(items)
    }

    pub fn unread_count(&self, user_id: i32) -> AppResult<i64> {
        Ok(self.repo.count_unread(user_id)?)
    }

    pub fn mark_read(&self, user_id: i32, notification_id: i32) -> AppResult<Notification> {
        self.repo
            .mark_notification_read(notification_id, user_id)?
            .ok_or_else(|| AppError::not_found("Notification"))
    }

    pub fn mark_all_read(&self, user_id: i32) -> AppResult<usize> {
        Ok(self.repo.mark_all_notifications_read(user_id)?)
    }

    pub fn preferences(&self, user_id: i32) -> AppResult<NotificationPreferences> {
        Ok(self
            .repo
            .find_preferences(user_id)?
            .unwrap_or_else(|| NotificationPreferences::enabled_for(user_id, Utc::now().naive_utc())))
    }

    pub fn update_preferences(
        &self,
        user_id: i32,
        update: PreferencesUpdate,
    ) -> AppResult<NotificationPreferences> {
        let mut prefs = self.preferences(user_id)?;
        update.apply(&mut prefs);
        Ok(self.repo.save_preferences(prefs)?)
    }
}

use super::PgStore;
use crate::error::RepoResult;
use crate::models::{NewNotification, Notification, NotificationPreferences};
use crate::repository::NotificationRepository;
use crate::schema::{notification_preferences, notifications};
use chrono::Utc;
use diesel::prelude::*;

impl NotificationRepository for PgStore {
    fn insert_notification(&self, notification: NewNotification) -> RepoResult<Notification> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(notifications::table)
            .values(&notification)
            .get_result::<Notification>(&mut conn)?)
    }

    fn list_notifications(
        &self,
        user_id: i32,
        unread_only: bool,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Notification>, i64)> {
        let mut conn = self.conn()?;

        let mut count_query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .into_boxed();
        let mut items_query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .into_boxed();
        if unread_only {
            count_query = count_query.filter(notifications::is_read.eq(false));
            items_query = items_query.filter(notifications::is_read.eq(false));
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;
        let items = items_query
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .offset(offset)
            .limit(limit)
            .load::<Notification>(&mut conn)?;

        Ok((items, total))
    }

    fn mark_notification_read(&self, id: i32, user_id: i32) -> RepoResult<Option<Notification>> {
        let mut conn = self.conn()?;
        Ok(diesel::update(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::user_id.eq(user_id)),
        )
        .set(notifications::is_read.eq(true))
        .get_result::<Notification>(&mut conn)
        .optional()?)
    }

    fn mark_all_notifications_read(&self, user_id: i32) -> RepoResult<usize> {
        let mut conn = self.conn()?;
        Ok(diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?)
    }

    fn count_unread(&self, user_id: i32) -> RepoResult<i64> {
        let mut conn = self.conn()?;
        Ok(notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)?)
    }

    fn find_preferences(&self, user_id: i32) -> RepoResult<Option<NotificationPreferences>> {
        let mut conn = self.conn()?;
        Ok(notification_preferences::table
            .find(user_id)
            .first::<NotificationPreferences>(&mut conn)
            .optional()?)
    }

    fn save_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> RepoResult<NotificationPreferences> {
        let mut conn = self.conn()?;
        let row = NotificationPreferences {
            updated_at: Utc::now().naive_utc(),
            ..preferences
        };
        Ok(diesel::insert_into(notification_preferences::table)
            .values(&row)
            .on_conflict(notification_preferences::user_id)
            .do_update()
            .set(&row)
            .get_result::<NotificationPreferences>(&mut conn)?)
    }
}

use super::PgStore;
use crate::error::{RepoError, RepoResult};
use crate::models::{
    Automation, AutomationChanges, AutomationLog, NewAutomation, NewAutomationLog, TriggerType,
};
use crate::repository::AutomationRepository;
use crate::schema::{automation_logs, automations};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

impl AutomationRepository for PgStore {
    fn insert_automation(&self, automation: NewAutomation) -> RepoResult<Automation> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(automations::table)
            .values(&automation)
            .get_result::<Automation>(&mut conn)?)
    }

    fn find_automation(&self, id: i32) -> RepoResult<Option<Automation>> {
        let mut conn = self.conn()?;
        Ok(automations::table
            .find(id)
            .first::<Automation>(&mut conn)
            .optional()?)
    }

    fn list_automations(&self, project_id: Option<i32>) -> RepoResult<Vec<Automation>> {
        let mut conn = self.conn()?;
        let query = match project_id {
            Some(project_id) => automations::table
                .filter(automations::project_id.eq(project_id))
                .into_boxed(),
            None => automations::table
                .filter(automations::project_id.is_null())
                .into_boxed(),
        };
        Ok(query
            .order(automations::id.asc())
            .load::<Automation>(&mut conn)?)
    }

    fn list_active_automations(
        &self,
        trigger: TriggerType,
        project_id: Option<i32>,
    ) -> RepoResult<Vec<Automation>> {
        let mut conn = self.conn()?;
        let query = automations::table
            .filter(automations::is_active.eq(true))
            .filter(automations::trigger_type.eq(trigger))
            .into_boxed();
        let query = match project_id {
            Some(project_id) => query.filter(
                automations::project_id
                    .is_null()
                    .or(automations::project_id.eq(project_id)),
            ),
            None => query.filter(automations::project_id.is_null()),
        };
        Ok(query
            .order(automations::id.asc())
            .load::<Automation>(&mut conn)?)
    }

    fn update_automation(&self, id: i32, changes: AutomationChanges) -> RepoResult<Automation> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        diesel::update(automations::table.find(id))
            .set((&changes, automations::updated_at.eq(now)))
            .get_result::<Automation>(&mut conn)
            .optional()?
            .ok_or(RepoError::NotFound("automation"))
    }

    fn delete_automation(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        // Logs cascade
        match diesel::delete(automations::table.find(id)).execute(&mut conn)? {
            0 => Err(RepoError::NotFound("automation")),
            _ => Ok(()),
        }
    }

    fn record_automation_run(&self, id: i32, at: NaiveDateTime) -> RepoResult<()> {
        let mut conn = self.conn()?;
        diesel::update(automations::table.find(id))
            .set((
                automations::execution_count.eq(automations::execution_count + 1),
                automations::last_executed_at.eq(Some(at)),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn insert_automation_log(&self, log: NewAutomationLog) -> RepoResult<AutomationLog> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(automation_logs::table)
            .values(&log)
            .get_result::<AutomationLog>(&mut conn)?)
    }

    fn list_automation_logs(
        &self,
        automation_id: i32,
        offset: i64,
        limit: i64,
    ) -> RepoResult<Vec<AutomationLog>> {
        let mut conn = self.conn()?;
        Ok(automation_logs::table
            .filter(automation_logs::automation_id.eq(automation_id))
            .order((automation_logs::executed_at.desc(), automation_logs::id.desc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)?)
    }
}

use super::PgStore;
use crate::error::{RepoError, RepoResult};
use crate::models::{Integration, NewIntegration, NewReport, Report, ReportChanges};
use crate::repository::{IntegrationRepository, ReportRepository};
use crate::schema::{integrations, reports};
use chrono::Utc;
use diesel::prelude::*;

impl ReportRepository for PgStore {
    fn insert_report(&self, report: NewReport) -> RepoResult<Report> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(reports::table)
            .values(&report)
            .get_result::<Report>(&mut conn)?)
    }

    fn find_report(&self, id: i32) -> RepoResult<Option<Report>> {
        let mut conn = self.conn()?;
        Ok(reports::table
            .find(id)
            .first::<Report>(&mut conn)
            .optional()?)
    }

    fn list_reports(&self, project_id: i32) -> RepoResult<Vec<Report>> {
        let mut conn = self.conn()?;
        Ok(reports::table
            .filter(reports::project_id.eq(project_id))
            .order(reports::id.asc())
            .load(&mut conn)?)
    }

    fn update_report(&self, id: i32, changes: ReportChanges) -> RepoResult<Report> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        diesel::update(reports::table.find(id))
            .set((&changes, reports::updated_at.eq(now)))
            .get_result::<Report>(&mut conn)
            .optional()?
            .ok_or(RepoError::NotFound("report"))
    }

    fn delete_report(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(reports::table.find(id)).execute(&mut conn)? {
            0 => Err(RepoError::NotFound("report")),
            _ => Ok(()),
        }
    }
}

impl IntegrationRepository for PgStore {
    fn insert_integration(&self, integration: NewIntegration) -> RepoResult<Integration> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(integrations::table)
            .values(&integration)
            .get_result::<Integration>(&mut conn)?)
    }

    fn find_integration(&self, id: i32) -> RepoResult<Option<Integration>> {
        let mut conn = self.conn()?;
        Ok(integrations::table
            .find(id)
            .first::<Integration>(&mut conn)
            .optional()?)
    }

    fn list_integrations(&self, project_id: i32) -> RepoResult<Vec<Integration>> {
        let mut conn = self.conn()?;
        Ok(integrations::table
            .filter(integrations::project_id.eq(project_id))
            .order(integrations::id.asc())
            .load(&mut conn)?)
    }

    fn delete_integration(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(integrations::table.find(id)).execute(&mut conn)? {
            0 => Err(RepoError::NotFound("integration")),
            _ => Ok(()),
        }
    }
}

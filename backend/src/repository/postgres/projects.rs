use super::PgStore;
use crate::error::{RepoError, RepoResult};
use crate::models::{NewProject, NewProjectMember, Project, ProjectChanges, ProjectMember};
use crate::repository::ProjectRepository;
use crate::schema::{project_members, projects};
use chrono::Utc;
use diesel::prelude::*;

impl ProjectRepository for PgStore {
    fn insert_project(&self, project: NewProject) -> RepoResult<Project> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(projects::table)
            .values(&project)
            .get_result::<Project>(&mut conn)?)
    }

    fn find_project(&self, id: i32) -> RepoResult<Option<Project>> {
        let mut conn = self.conn()?;
        Ok(projects::table
            .find(id)
            .first::<Project>(&mut conn)
            .optional()?)
    }

    fn list_projects_for_user(&self, user_id: i32) -> RepoResult<Vec<Project>> {
        let mut conn = self.conn()?;
        Ok(projects::table
            .inner_join(project_members::table)
            .filter(project_members::user_id.eq(user_id))
            .select(Project::as_select())
            .order((projects::created_at.desc(), projects::id.desc()))
            .load(&mut conn)?)
    }

    fn page_projects_for_user(
        &self,
        user_id: i32,
        offset: i64,
        limit: i64,
    ) -> RepoResult<(Vec<Project>, i64)> {
        let mut conn = self.conn()?;

        let total: i64 = projects::table
            .inner_join(project_members::table)
            .filter(project_members::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)?;

        let items = projects::table
            .inner_join(project_members::table)
            .filter(project_members::user_id.eq(user_id))
            .select(Project::as_select())
            .order((projects::created_at.desc(), projects::id.desc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)?;

        Ok((items, total))
    }

    fn update_project(&self, id: i32, changes: ProjectChanges) -> RepoResult<Project> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        diesel::update(projects::table.find(id))
            .set((&changes, projects::updated_at.eq(now)))
            .get_result::<Project>(&mut conn)
            .optional()?
            .ok_or(RepoError::NotFound("project"))
    }

    fn delete_project(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        // Sections, tasks, members, automations, reports and integrations cascade
        match diesel::delete(projects::table.find(id)).execute(&mut conn)? {
            0 => Err(RepoError::NotFound("project")),
            _ => Ok(()),
        }
    }

    fn insert_member(&self, member: NewProjectMember) -> RepoResult<ProjectMember> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(project_members::table)
            .values(&member)
            .get_result::<ProjectMember>(&mut conn)?)
    }

    fn find_member(&self, project_id: i32, user_id: i32) -> RepoResult<Option<ProjectMember>> {
        let mut conn = self.conn()?;
        Ok(project_members::table
            .find((project_id, user_id))
            .first::<ProjectMember>(&mut conn)
            .optional()?)
    }

    fn list_members(&self, project_id: i32) -> RepoResult<Vec<ProjectMember>> {
        let mut conn = self.conn()?;
        Ok(project_members::table
            .filter(project_members::project_id.eq(project_id))
            .order(project_members::joined_at.asc())
            .load(&mut conn)?)
    }

    fn delete_member(&self, project_id: i32, user_id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(project_members::table.find((project_id, user_id)))
            .execute(&mut conn)?
        {
            0 => Err(RepoError::NotFound("member")),
            _ => Ok(()),
        }
    }
}

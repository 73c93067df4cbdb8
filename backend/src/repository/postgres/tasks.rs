use super::PgStore;
use crate::error::{RepoError, RepoResult};
use crate::models::{
    Comment, NewComment, NewSection, NewTask, Section, SectionChanges, Task, TaskChanges,
    TaskStatus,
};
use crate::repository::{CommentRepository, SectionRepository, TaskRepository};
use crate::schema::{comments, sections, tasks};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

impl SectionRepository for PgStore {
    fn insert_section(&self, section: NewSection) -> RepoResult<Section> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(sections::table)
            .values(&section)
            .get_result::<Section>(&mut conn)?)
    }

    fn find_section(&self, id: i32) -> RepoResult<Option<Section>> {
        let mut conn = self.conn()?;
        Ok(sections::table
            .find(id)
            .first::<Section>(&mut conn)
            .optional()?)
    }

    fn list_sections(&self, project_id: i32) -> RepoResult<Vec<Section>> {
        let mut conn = self.conn()?;
        Ok(sections::table
            .filter(sections::project_id.eq(project_id))
            .order((sections::position.asc(), sections::id.asc()))
            .load(&mut conn)?)
    }

    fn update_section(&self, id: i32, changes: SectionChanges) -> RepoResult<Section> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        diesel::update(sections::table.find(id))
            .set((&changes, sections::updated_at.eq(now)))
            .get_result::<Section>(&mut conn)
            .optional()?
            .ok_or(RepoError::NotFound("section"))
    }

    fn delete_section(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        // tasks.section_id is ON DELETE SET NULL
        match diesel::delete(sections::table.find(id)).execute(&mut conn)? {
            0 => Err(RepoError::NotFound("section")),
            _ => Ok(()),
        }
    }
}

impl TaskRepository for PgStore {
    fn insert_task(&self, task: NewTask) -> RepoResult<Task> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(tasks::table)
            .values(&task)
            .get_result::<Task>(&mut conn)?)
    }

    fn find_task(&self, id: i32) -> RepoResult<Option<Task>> {
        let mut conn = self.conn()?;
        Ok(tasks::table.find(id).first::<Task>(&mut conn).optional()?)
    }

    fn list_tasks(&self, project_id: i32, section_id: Option<i32>) -> RepoResult<Vec<Task>> {
        let mut conn = self.conn()?;
        let mut query = tasks::table
            .filter(tasks::project_id.eq(project_id))
            .into_boxed();
        if let Some(section_id) = section_id {
            query = query.filter(tasks::section_id.eq(section_id));
        }
        Ok(query
            .order((tasks::position.asc(), tasks::id.asc()))
            .load::<Task>(&mut conn)?)
    }

    fn list_tasks_due_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<Vec<Task>> {
        let mut conn = self.conn()?;
        Ok(tasks::table
            .filter(tasks::status.ne(TaskStatus::Done))
            .filter(tasks::reminder_sent_at.is_null())
            .filter(tasks::due_date.ge(from))
            .filter(tasks::due_date.lt(to))
            .order(tasks::due_date.asc())
            .load::<Task>(&mut conn)?)
    }

    fn next_task_position(&self, project_id: i32, section_id: Option<i32>) -> RepoResult<i32> {
        let mut conn = self.conn()?;
        let mut query = tasks::table
            .filter(tasks::project_id.eq(project_id))
            .select(diesel::dsl::max(tasks::position))
            .into_boxed();
        query = match section_id {
            Some(section_id) => query.filter(tasks::section_id.eq(section_id)),
            None => query.filter(tasks::section_id.is_null()),
        };
        let max: Option<i32> = query.first(&mut conn)?;
        Ok(max.map(|p| p + 1).unwrap_or(0))
    }

    fn update_task(&self, id: i32, changes: TaskChanges) -> RepoResult<Task> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        diesel::update(tasks::table.find(id))
            .set((&changes, tasks::updated_at.eq(now)))
            .get_result::<Task>(&mut conn)
            .optional()?
            .ok_or(RepoError::NotFound("task"))
    }

    fn delete_task(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(tasks::table.find(id)).execute(&mut conn)? {
            0 => Err(RepoError::NotFound("task")),
            _ => Ok(()),
        }
    }
}

impl CommentRepository for PgStore {
    fn insert_comment(&self, comment: NewComment) -> RepoResult<Comment> {
        let mut conn = self.conn()?;
        Ok(diesel::insert_into(comments::table)
            .values(&comment)
            .get_result::<Comment>(&mut conn)?)
    }

    fn find_comment(&self, id: i32) -> RepoResult<Option<Comment>> {
        let mut conn = self.conn()?;
        Ok(comments::table
            .find(id)
            .first::<Comment>(&mut conn)
            .optional()?)
    }

    fn list_comments(&self, task_id: i32) -> RepoResult<Vec<Comment>> {
        let mut conn = self.conn()?;
        Ok(comments::table
            .filter(comments::task_id.eq(task_id))
            .order(comments::created_at.asc())
            .load(&mut conn)?)
    }

    fn delete_comment(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        match diesel::delete(comments::table.find(id)).execute(&mut conn)? {
            0 => Err(RepoError::NotFound("comment")),
            _ => Ok(()),
        }
    }
}

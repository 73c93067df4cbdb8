use crate::error::{AppError, AppResult};
use crate::models::{Project, ProjectMember};
use crate::repository::Repositories;

/// Membership of `user_id` in an existing project.
pub fn require_member(
    repos: &Repositories,
    project_id: i32,
    user_id: i32,
) -> AppResult<(Project, ProjectMember)> {
    let project = repos
        .projects
        .find_project(project_id)?
        .ok_or_else(|| AppError::not_found("Project"))?;
    let member = repos
        .projects
        .find_member(project_id, user_id)?
        .ok_or_else(AppError::forbidden)?;
    Ok((project, member))
}

/// Like [`require_member`] but rejects read-only members.
pub fn require_writer(
    repos: &Repositories,
    project_id: i32,
    user_id: i32,
) -> AppResult<(Project, ProjectMember)> {
    let (project, member) = require_member(repos, project_id, user_id)?;
    if !member.role.can_write() {
        return Err(AppError::Forbidden(
            "Viewers cannot modify this project".to_string(),
        ));
    }
    Ok((project, member))
}

/// Owners and admins only.
pub fn require_manager(
    repos: &Repositories,
    project_id: i32,
    user_id: i32,
) -> AppResult<(Project, ProjectMember)> {
    let (project, member) = require_member(repos, project_id, user_id)?;
    if !member.role.can_manage() {
        return Err(AppError::Forbidden(
            "Only project owners and admins can do this".to_string(),
        ));
    }
    Ok((project, member))
}

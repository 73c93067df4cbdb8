use crate::error::{AppError, AppResult};
use crate::models::{
    MemberRole, NewNotification, NewProject, NewProjectMember, NotificationType, Page, Project,
    ProjectChanges, ProjectMember, TriggerType, page_window,
};
use crate::repository::Repositories;
use crate::services::access::{require_manager, require_member};
use crate::services::events::{DomainEvent, EventDispatcher};
use crate::services::notifications::NotificationService;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Absent fields are left untouched; an empty string clears an optional one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberInput {
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<MemberRole>,
}

pub(crate) fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim().to_string();
        (!v.is_empty()).then_some(v)
    })
}

pub(crate) fn required_name(value: &str, what: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required", what)));
    }
    Ok(value.to_string())
}

pub struct ProjectService {
    repos: Repositories,
    notifications: Arc<NotificationService>,
    events: Arc<EventDispatcher>,
}

impl ProjectService {
    pub fn new(
        repos: Repositories,
        notifications: Arc<NotificationService>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            repos,
            notifications,
            events,
        }
    }

    pub fn create(&self, user_id: i32, input: CreateProjectInput) -> AppResult<Project> {
        let project = self.repos.projects.insert_project(NewProject {
            name: required_name(&input.name, "Project name")?,
            description: clearable(input.description).flatten(),
            color: clearable(input.color).flatten(),
            owner_id: user_id,
        })?;
        self.repos.projects.insert_member(NewProjectMember {
            project_id: project.id,
            user_id,
            role: MemberRole::Owner,
        })?;

        log::info!("Project {} created by user {}", project.id, user_id);
        self.events.publish(DomainEvent::new(
            TriggerType::ProjectCreated,
            Some(project.id),
            Some(user_id),
        ));
        Ok(project)
    }

    pub fn get(&self, user_id: i32, project_id: i32) -> AppResult<Project> {
        Ok(require_member(&self.repos, project_id, user_id)?.0)
    }

    pub fn list(&self, user_id: i32) -> AppResult<Vec<Project>> {
        Ok(self.repos.projects.list_projects_for_user(user_id)?)
    }

    pub fn paginated(
        &self,
        user_id: i32,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> AppResult<Page<Project>> {
        let (offset, limit) = page_window(offset, limit);
        let (items, total) = self
            .repos
            .projects
            .page_projects_for_user(user_id, offset, limit)?;
        Ok(Page::new(items, total, offset, limit))
    }

    pub fn update(
        &self,
        user_id: i32,
        project_id: i32,
        input: UpdateProjectInput,
    ) -> AppResult<Project> {
        require_manager(&self.repos, project_id, user_id)?;
        let changes = ProjectChanges {
            name: input
                .name
                .as_deref()
                .map(|n| required_name(n, "Project name"))
                .transpose()?,
            description: clearable(input.description),
            color: clearable(input.color),
        };
        Ok(self.repos.projects.update_project(project_id, changes)?)
    }

    pub fn delete(&self, user_id: i32, project_id: i32) -> AppResult<()> {
        let (_, member) = require_member(&self.repos, project_id, user_id)?;
        if member.role != MemberRole::Owner {
            return Err(AppError::Forbidden(
                "Only the project owner can delete it".to_string(),
            ));
        }
        self.repos.projects.delete_project(project_id)?;
        log::info!("Project {} deleted by user {}", project_id, user_id);
        Ok(())
    }

    pub fn members(&self, user_id: i32, project_id: i32) -> AppResult<Vec<ProjectMember>> {
        require_member(&self.repos, project_id, user_id)?;
        Ok(self.repos.projects.list_members(project_id)?)
    }

    pub fn add_member(
        &self,
        user_id: i32,
        project_id: i32,
        input: AddMemberInput,
    ) -> AppResult<ProjectMember> {
        let (project, _) = require_manager(&self.repos, project_id, user_id)?;

        let invitee = match (input.user_id, input.email.as_deref()) {
            (Some(id), _) => self.repos.users.find_user(id)?,
            (None, Some(email)) => self
                .repos
                .users
                .find_user_by_email(&email.trim().to_lowercase())?,
            (None, None) => return Err(AppError::validation("userId or email is required")),
        }
        .ok_or_else(|| AppError::not_found("User"))?;

        let role = input.role.unwrap_or(MemberRole::Member);
        if role == MemberRole::Owner {
            return Err(AppError::validation("A project has exactly one owner"));
        }

        let member = self
            .repos
            .projects
            .insert_member(NewProjectMember {
                project_id,
                user_id: invitee.id,
                role,
            })
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => {
                    AppError::Conflict("User is already a member of this project".to_string())
                }
                other => other,
            })?;

        self.notifications.notify(NewNotification {
            user_id: invitee.id,
            kind: NotificationType::ProjectInvite,
            title: "Added to project".to_string(),
            message: format!("You have been added to \"{}\"", project.name),
            related_task_id: None,
            related_project_id: Some(project_id),
        })?;
        Ok(member)
    }

    pub fn remove_member(&self, user_id: i32, project_id: i32, member_id: i32) -> AppResult<()> {
        let project = if user_id == member_id {
            require_member(&self.repos, project_id, user_id)?.0
        } else {
            require_manager(&self.repos, project_id, user_id)?.0
        };
        if member_id == project.owner_id {
            return Err(AppError::validation("The project owner cannot be removed"));
        }
        Ok(self.repos.projects.delete_member(project_id, member_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::NotificationHub;
    use crate::services::automation_engine::AutomationEngine;
    use crate::services::email::EmailOutbox;
    use crate::models::NewUser;

    fn service() -> (ProjectService, Repositories) {
        let repos = Repositories::in_memory();
        let hub = Arc::new(NotificationHub::new());
        let notifications = Arc::new(NotificationService::new(
            repos.notifications.clone(),
            hub.clone(),
        ));
        let (email, _) = EmailOutbox::channel();
        let engine = Arc::new(AutomationEngine::new(
            repos.clone(),
            notifications.clone(),
            email,
        ));
        let events = Arc::new(EventDispatcher::new(engine, hub));
        (
            ProjectService::new(repos.clone(), notifications, events),
            repos,
        )
    }

    fn user(repos: &Repositories, email: &str) -> i32 {
        repos
            .users
            .insert_user(NewUser {
                email: email.to_string(),
                name: email.to_string(),
                password_hash: "x".to_string(),
            })
            .unwrap()
            .id
    }

    fn create(service: &ProjectService, owner: i32, name: &str) -> Project {
        service
            .create(
                owner,
                CreateProjectInput {
                    name: name.to_string(),
                    description: None,
                    color: Some("#ff0000".to_string()),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_creator_becomes_owner_member() {
        let (service, repos) = service();
        let owner = user(&repos, "o@example.com");

        let project = create(&service, owner, "Roadmap");

        let members = service.members(owner, project.id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, MemberRole::Owner);
        assert_eq!(project.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_paginated_window() {
        let (service, repos) = service();
        let owner = user(&repos, "o@example.com");
        for i in 0..23 {
            create(&service, owner, &format!("Project {}", i));
        }

        let page = service.paginated(owner, Some(10), Some(5)).unwrap();

        assert_eq!(page.items.len(), 5);
        assert_eq!(page.offset, 10);
        assert_eq!(page.limit, 5);
        assert_eq!(page.total, 23);
        assert!(page.has_more);

        let tail = service.paginated(owner, Some(20), Some(5)).unwrap();
        assert_eq!(tail.items.len(), 3);
        assert!(!tail.has_more);
    }

    #[test]
    fn test_outsiders_are_forbidden() {
        let (service, repos) = service();
        let owner = user(&repos, "o@example.com");
        let outsider = user(&repos, "x@example.com");
        let project = create(&service, owner, "Secret");

        assert!(matches!(
            service.get(outsider, project.id),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.get(owner, project.id + 999),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_member_sends_invite() {
        let (service, repos) = service();
        let owner = user(&repos, "o@example.com");
        let invitee = user(&repos, "i@example.com");
        let project = create(&service, owner, "Team");

        let member = service
            .add_member(
                owner,
                project.id,
                AddMemberInput {
                    user_id: None,
                    email: Some("I@Example.com".to_string()),
                    role: None,
                },
            )
            .unwrap();

        assert_eq!(member.user_id, invitee);
        assert_eq!(member.role, MemberRole::Member);
        let (invites, _) = repos
            .notifications
            .list_notifications(invitee, false, 0, 10)
            .unwrap();
        assert_eq!(invites.len(), 1);
        assert_eq!(invites[0].kind, NotificationType::ProjectInvite);

        let again = service.add_member(
            owner,
            project.id,
            AddMemberInput {
                user_id: Some(invitee),
                email: None,
                role: None,
            },
        );
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_members_cannot_manage_or_delete() {
        let (service, repos) = service();
        let owner = user(&repos, "o@example.com");
        let member = user(&repos, "m@example.com");
        let project = create(&service, owner, "Team");
        service
            .add_member(
                owner,
                project.id,
                AddMemberInput {
                    user_id: Some(member),
                    email: None,
                    role: Some(MemberRole::Member),
                },
            )
            .unwrap();

        assert!(matches!(
            service.update(member, project.id, UpdateProjectInput::default()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(member, project.id),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.remove_member(owner, project.id, owner),
            Err(AppError::Validation(_))
        ));

        // Members may leave on their own.
        service.remove_member(member, project.id, member).unwrap();
        assert_eq!(service.members(owner, project.id).unwrap().len(), 1);
    }

    #[test]
    fn test_update_clears_description_with_empty_string() {
        let (service, repos) = service();
        let owner = user(&repos, "o@example.com");
        let project = service
            .create(
                owner,
                CreateProjectInput {
                    name: "Docs".to_string(),
                    description: Some("Old".to_string()),
                    color: None,
                },
            )
            .unwrap();

        let updated = service
            .update(
                owner,
                project.id,
                UpdateProjectInput {
                    name: Some("Docs v2".to_string()),
                    description: Some(String::new()),
                    color: None,
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Docs v2");
        assert_eq!(updated.description, None);
    }

    #[test]
    fn test_owner_can_delete() {
        let (service, repos) = service();
        let owner = user(&repos, "o@example.com");
        let project = create(&service, owner, "Temp");

        service.delete(owner, project.id).unwrap();

        assert!(service.list(owner).unwrap().is_empty());
    }
}

use crate::error::{AppError, AppResult};
use crate::models::{Comment, NewComment, NewNotification, NotificationType, Task, TriggerType};
use crate::repository::Repositories;
use crate::services::access::{require_member, require_writer};
use crate::services::events::{DomainEvent, EventDispatcher};
use crate::services::notifications::NotificationService;
use serde::Deserialize;
use std::sync::Arc;

const MAX_COMMENT_LEN: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct CreateCommentInput {
    pub content: String,
}

pub struct CommentService {
    repos: Repositories,
    notifications: Arc<NotificationService>,
    events: Arc<EventDispatcher>,
}

impl CommentService {
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

    fn task(&self, task_id: i32) -> AppResult<Task> {
        self.repos
            .tasks
            .find_task(task_id)?
            .ok_or_else(|| AppError::not_found("Task"))
    }

    pub fn add(&self, user_id: i32, task_id: i32, input: CreateCommentInput) -> AppResult<Comment> {
        let task = self.task(task_id)?;
        require_writer(&self.repos, task.project_id, user_id)?;

        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::validation(format!(
                "Comment is limited to {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let comment = self.repos.comments.insert_comment(NewComment {
            task_id,
            author_id: user_id,
            content: content.to_string(),
        })?;

        // Assignee and creator, once each, never the author.
        let mut recipients = Vec::with_capacity(2);
        for candidate in [task.assignee_id, Some(task.creator_id)].into_iter().flatten() {
            if candidate != user_id && !recipients.contains(&candidate) {
                recipients.push(candidate);
            }
        }
        for recipient in recipients {
            if let Err(e) = self.notifications.notify(NewNotification {
                user_id: recipient,
                kind: NotificationType::CommentAdded,
                title: "New comment".to_string(),
                message: format!("New comment on \"{}\"", task.title),
                related_task_id: Some(task.id),
                related_project_id: Some(task.project_id),
            }) {
                log::error!(
                    "Failed to notify user {} about comment {}: {}",
                    recipient, comment.id, e
                );
            }
        }

        let mut event = DomainEvent::for_task(TriggerType::CommentAdded, &task, Some(user_id));
        event.payload.comment_id = Some(comment.id);
        self.events.publish(event);

        Ok(comment)
    }

    pub fn list(&self, user_id: i32, task_id: i32) -> AppResult<Vec<Comment>> {
        let task = self.task(task_id)?;
        require_member(&self.repos, task.project_id, user_id)?;
        Ok(self.repos.comments.list_comments(task_id)?)
    }

    pub fn delete(&self, user_id: i32, comment_id: i32) -> AppResult<()> {
        let comment = self
            .repos
            .comments
            .find_comment(comment_id)?
            .ok_or_else(|| AppError::not_found("Comment"))?;
        if comment.author_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete a comment".to_string(),
            ));
        }
        Ok(self.repos.comments.delete_comment(comment_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{MemberRole, NewUser};
    use crate::services::projects::{AddMemberInput, CreateProjectInput};
    use crate::services::tasks::CreateTaskInput;
    use crate::state::AppState;

    fn setup() -> (AppState, i32, i32, Task) {
        let (state, _) = AppState::in_memory(AppConfig::default());
        let add = |email: &str| {
            state
                .repos
                .users
                .insert_user(NewUser {
                    email: email.to_string(),
                    name: email.to_string(),
                    password_hash: "x".to_string(),
                })
                .unwrap()
                .id
        };
        let creator = add("creator@example.com");
        let assignee = add("assignee@example.com");
        let project = state
            .projects
            .create(
                creator,
                CreateProjectInput {
                    name: "Talk".to_string(),
                    description: None,
                    color: None,
                },
            )
            .unwrap();
        state
            .projects
            .add_member(
                creator,
                project.id,
                AddMemberInput {
                    user_id: Some(assignee),
                    email: None,
                    role: Some(MemberRole::Member),
                },
            )
            .unwrap();
        let task = state
            .tasks
            .create(
                creator,
                project.id,
                CreateTaskInput {
                    title: "Discuss".to_string(),
                    assignee_id: Some(assignee),
                    ..Default::default()
                },
            )
            .unwrap();
        state.notifications.mark_all_read(assignee).unwrap();
        (state, creator, assignee, task)
    }

    fn comment(state: &AppState, author: i32, task_id: i32, content: &str) -> AppResult<Comment> {
        state.comments.add(
            author,
            task_id,
            CreateCommentInput {
                content: content.to_string(),
            },
        )
    }

    #[test]
    fn test_comment_notifies_everyone_but_the_author() {
        let (state, creator, assignee, task) = setup();

        comment(&state, assignee, task.id, "On it").unwrap();

        assert_eq!(state.notifications.unread_count(creator).unwrap(), 1);
        assert_eq!(state.notifications.unread_count(assignee).unwrap(), 0);
        let unread = state.notifications.unread(creator).unwrap();
        assert_eq!(unread[0].kind, NotificationType::CommentAdded);
    }

    #[test]
    fn test_empty_comment_is_rejected() {
        let (state, creator, _, task) = setup();
        assert!(matches!(
            comment(&state, creator, task.id, "   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_only_author_can_delete() {
        let (state, creator, assignee, task) = setup();
        let c = comment(&state, creator, task.id, "Please review").unwrap();

        assert!(matches!(
            state.comments.delete(assignee, c.id),
            Err(AppError::Forbidden(_))
        ));
        state.comments.delete(creator, c.id).unwrap();
        assert!(state.comments.list(creator, task.id).unwrap().is_empty());
    }

    #[test]
    fn test_comments_on_unknown_task() {
        let (state, creator, _, _) = setup();
        assert!(matches!(
            state.comments.list(creator, 987_654),
            Err(AppError::NotFound(_))
        ));
    }
}

use crate::{
    error::AppResult,
    services::{
        auth::Claims,
        comments::CreateCommentInput,
        tasks::{CreateTaskInput, MoveTaskInput, UpdateTaskInput},
    },
    state::AppState,
};
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub section_id: Option<i32>,
}

// ============================================================================
// Tasks
// ============================================================================

#[get("/{project_id}/tasks")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    query: web::Query<TaskListQuery>,
) -> AppResult<HttpResponse> {
    let tasks = state
        .tasks
        .list(claims.user_id()?, path.into_inner(), query.section_id)?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[post("/{project_id}/tasks")]
pub async fn create_task(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<CreateTaskInput>,
) -> AppResult<HttpResponse> {
    let task = state
        .tasks
        .create(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Created().json(task))
}

#[get("/{task_id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let task = state.tasks.get(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(task))
}

#[put("/{task_id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<UpdateTaskInput>,
) -> AppResult<HttpResponse> {
    let task = state
        .tasks
        .update(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Ok().json(task))
}

#[post("/{task_id}/move")]
pub async fn move_task(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<MoveTaskInput>,
) -> AppResult<HttpResponse> {
    let task = state
        .tasks
        .move_to(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{task_id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.tasks.delete(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

// ============================================================================
// Comments
// ============================================================================

#[get("/{task_id}/comments")]
pub async fn list_comments(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let comments = state.comments.list(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(comments))
}

#[post("/{task_id}/comments")]
pub async fn add_comment(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<CreateCommentInput>,
) -> AppResult<HttpResponse> {
    let comment = state
        .comments
        .add(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Created().json(comment))
}

#[delete("/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.comments.delete(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TaskStatus};

    #[test]
    fn test_task_list_query_camel_case() {
        let query: TaskListQuery = serde_json::from_str(r#"{"sectionId": 4}"#).unwrap();
        assert_eq!(query.section_id, Some(4));
    }

    #[test]
    fn test_create_task_full() {
        let json = r#"{
            "title": "Ship it",
            "priority": "URGENT",
            "status": "IN_REVIEW",
            "assigneeId": 7,
            "dueDate": "2030-01-01T09:00:00Z"
        }"#;
        let input: CreateTaskInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.priority, Some(Priority::Urgent));
        assert_eq!(input.status, Some(TaskStatus::InReview));
        assert_eq!(input.assignee_id, Some(7));
        assert!(input.due_date.is_some());
    }

    #[test]
    fn test_update_task_null_clears_assignee() {
        let input: UpdateTaskInput =
            serde_json::from_str(r#"{"assigneeId": null, "title": "Renamed"}"#).unwrap();

        assert_eq!(input.assignee_id, Some(None));
        assert_eq!(input.due_date, None);
        assert_eq!(input.title.as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_move_to_no_section() {
        let input: MoveTaskInput = serde_json::from_str(r#"{"sectionId": null}"#).unwrap();
        assert_eq!(input.section_id, None);
    }

    #[test]
    fn test_comment_requires_content() {
        let result: Result<CreateCommentInput, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }
}

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced to API callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("You do not have access to this resource".to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(msg) = self {
            log::error!("Internal error: {}", msg);
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<diesel::result::Error> for RepoError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        match err {
            DieselError::NotFound => RepoError::NotFound("record"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RepoError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                RepoError::NotFound(foreign_key_target(info.constraint_name()))
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for RepoError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        RepoError::Database(format!("Database connection error: {}", err))
    }
}

fn foreign_key_target(constraint: Option<&str>) -> &'static str {
    match constraint.unwrap_or_default() {
        c if c.contains("_section_id") => "section",
        c if c.contains("_project_id") => "project",
        c if c.contains("_task_id") => "task",
        c if c.ends_with("_id_fkey") => "user",
        _ => "referenced record",
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::Database(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::forbidden().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("Task").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AppError::not_found("Project").to_string(), "Project not found");
    }

    #[test]
    fn test_repo_errors_convert() {
        assert_eq!(
            AppError::from(RepoError::NotFound("task")),
            AppError::NotFound("task not found".to_string())
        );
        assert!(matches!(
            AppError::from(RepoError::Conflict("dup".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::Database("boom".into())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_diesel_not_found_maps_to_repo_not_found() {
        let err: RepoError = diesel::result::Error::NotFound.into();
        assert_eq!(err, RepoError::NotFound("record"));
    }

    #[test]
    fn test_foreign_key_target_names() {
        assert_eq!(foreign_key_target(Some("tasks_section_id_fkey")), "section");
        assert_eq!(foreign_key_target(Some("tasks_project_id_fkey")), "project");
        assert_eq!(foreign_key_target(Some("tasks_assignee_id_fkey")), "user");
        assert_eq!(foreign_key_target(None), "referenced record");
    }

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let resp = AppError::Conflict("Email already registered".into()).error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "CONFLICT");
        assert_eq!(json["message"], "Email already registered");
    }
}

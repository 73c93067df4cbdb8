use crate::{
    error::AppResult,
    services::{auth::Claims, integrations::CreateIntegrationInput},
    state::AppState,
};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};

#[post("/{project_id}/integrations")]
pub async fn add_integration(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<CreateIntegrationInput>,
) -> AppResult<HttpResponse> {
    let created = state
        .integrations
        .create(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/{project_id}/integrations")]
pub async fn list_integrations(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let integrations = state
        .integrations
        .list(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(integrations))
}

#[delete("/{integration_id}")]
pub async fn delete_integration(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state
        .integrations
        .delete(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Inbound delivery from a third party, authenticated by body signature
#[post("/{integration_id}")]
pub async fn receive_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i32>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let receipt = state
        .integrations
        .handle_webhook(path.into_inner(), req.headers(), &body)?;
    Ok(HttpResponse::Accepted().json(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_integration_request_deserialization() {
        let json = r#"{"provider": "github", "name": "Main repo", "secret": "0123456789abcdef"}"#;
        let request: CreateIntegrationInput = serde_json::from_str(json).unwrap();

        assert_eq!(request.provider, "github");
        assert_eq!(request.name, "Main repo");
        assert_eq!(request.secret.as_deref(), Some("0123456789abcdef"));
    }

    #[test]
    fn test_add_integration_secret_is_optional() {
        let json = r#"{"provider": "jira", "name": "Tickets"}"#;
        let request: CreateIntegrationInput = serde_json::from_str(json).unwrap();

        assert!(request.secret.is_none());
    }

    #[test]
    fn test_add_integration_request_missing_provider_fails() {
        let json = r#"{"name": "Tickets"}"#;
        let result: Result<CreateIntegrationInput, _> = serde_json::from_str(json);

        assert!(result.is_err());
    }
}

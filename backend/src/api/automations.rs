use crate::{
    error::AppResult,
    services::{
        auth::Claims,
        automations::{CreateAutomationInput, UpdateAutomationInput},
    },
    state::AppState,
};
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationListQuery {
    /// Without a project, the caller's global automations are listed.
    pub project_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct LogsQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// List automations of a project, or the caller's global ones
#[get("")]
pub async fn list_automations(
    state: web::Data<AppState>,
    claims: Claims,
    query: web::Query<AutomationListQuery>,
) -> AppResult<HttpResponse> {
    let automations = state
        .automations
        .list(claims.user_id()?, query.project_id)?;
    Ok(HttpResponse::Ok().json(automations))
}

#[post("")]
pub async fn create_automation(
    state: web::Data<AppState>,
    claims: Claims,
    item: web::Json<CreateAutomationInput>,
) -> AppResult<HttpResponse> {
    let automation = state
        .automations
        .create(claims.user_id()?, item.into_inner())?;
    Ok(HttpResponse::Created().json(automation))
}

#[get("/{automation_id}")]
pub async fn get_automation(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let automation = state.automations.get(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(automation))
}

#[put("/{automation_id}")]
pub async fn update_automation(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<UpdateAutomationInput>,
) -> AppResult<HttpResponse> {
    let automation =
        state
            .automations
            .update(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Ok().json(automation))
}

#[delete("/{automation_id}")]
pub async fn delete_automation(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state
        .automations
        .delete(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Flip an automation between active and paused
#[post("/{automation_id}/toggle")]
pub async fn toggle_automation(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let automation = state
        .automations
        .toggle(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(automation))
}

/// Execution history, newest first
#[get("/{automation_id}/logs")]
pub async fn automation_logs(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    query: web::Query<LogsQuery>,
) -> AppResult<HttpResponse> {
    let logs = state.automations.logs(
        claims.user_id()?,
        path.into_inner(),
        query.offset,
        query.limit,
    )?;
    Ok(HttpResponse::Ok().json(logs))
}

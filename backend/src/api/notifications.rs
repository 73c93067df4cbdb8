use crate::{
    error::AppResult,
    services::{auth::Claims, notifications::PreferencesUpdate},
    state::AppState,
};
use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[get("")]
pub async fn list_notifications(
    state: web::Data<AppState>,
    claims: Claims,
    query: web::Query<NotificationQuery>,
) -> AppResult<HttpResponse> {
    let page = state.notifications.list(
        claims.user_id()?,
        query.unread_only,
        query.offset,
        query.limit,
    )?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/unread-count")]
pub async fn unread_count(state: web::Data<AppState>, claims: Claims) -> AppResult<HttpResponse> {
    let count = state.notifications.unread_count(claims.user_id()?)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "count": count })))
}

#[post("/read-all")]
pub async fn mark_all_read(state: web::Data<AppState>, claims: Claims) -> AppResult<HttpResponse> {
    let updated = state.notifications.mark_all_read(claims.user_id()?)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

#[get("/preferences")]
pub async fn get_preferences(
    state: web::Data<AppState>,
    claims: Claims,
) -> AppResult<HttpResponse> {
    let prefs = state.notifications.preferences(claims.user_id()?)?;
    Ok(HttpResponse::Ok().json(prefs))
}

#[put("/preferences")]
pub async fn update_preferences(
    state: web::Data<AppState>,
    claims: Claims,
    item: web::Json<PreferencesUpdate>,
) -> AppResult<HttpResponse> {
    let prefs = state
        .notifications
        .update_preferences(claims.user_id()?, item.into_inner())?;
    Ok(HttpResponse::Ok().json(prefs))
}

#[post("/{notification_id}/read")]
pub async fn mark_read(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let notification = state
        .notifications
        .mark_read(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(notification))
}

use crate::{
    error::AppResult,
    services::{
        auth::Claims,
        projects::{AddMemberInput, CreateProjectInput, UpdateProjectInput},
    },
    state::AppState,
};
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[get("")]
pub async fn list_projects(state: web::Data<AppState>, claims: Claims) -> AppResult<HttpResponse> {
    let projects = state.projects.list(claims.user_id()?)?;
    Ok(HttpResponse::Ok().json(projects))
}

#[get("/paginated")]
pub async fn list_projects_paginated(
    state: web::Data<AppState>,
    claims: Claims,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .projects
        .paginated(claims.user_id()?, query.offset, query.limit)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    claims: Claims,
    item: web::Json<CreateProjectInput>,
) -> AppResult<HttpResponse> {
    let project = state.projects.create(claims.user_id()?, item.into_inner())?;
    Ok(HttpResponse::Created().json(project))
}

#[get("/{project_id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let project = state.projects.get(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(project))
}

#[put("/{project_id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<UpdateProjectInput>,
) -> AppResult<HttpResponse> {
    let project = state
        .projects
        .update(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Ok().json(project))
}

#[delete("/{project_id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.projects.delete(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/{project_id}/members")]
pub async fn list_members(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let members = state.projects.members(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(members))
}

#[post("/{project_id}/members")]
pub async fn add_member(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<AddMemberInput>,
) -> AppResult<HttpResponse> {
    let member = state
        .projects
        .add_member(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Created().json(member))
}

#[delete("/{project_id}/members/{user_id}")]
pub async fn remove_member(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<(i32, i32)>,
) -> AppResult<HttpResponse> {
    let (project_id, member_id) = path.into_inner();
    state
        .projects
        .remove_member(claims.user_id()?, project_id, member_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Dashboard numbers for one project
#[get("/{project_id}/metrics")]
pub async fn project_metrics(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let metrics = state.dashboard.metrics(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(metrics))
}

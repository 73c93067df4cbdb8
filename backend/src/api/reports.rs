use crate::{
    error::AppResult,
    services::{
        auth::Claims,
        reports::{CreateReportInput, UpdateReportInput},
    },
    state::AppState,
};
use actix_web::{HttpResponse, delete, get, post, put, web};

#[get("/{project_id}/reports")]
pub async fn list_reports(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let reports = state.reports.list(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(reports))
}

#[post("/{project_id}/reports")]
pub async fn create_report(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<CreateReportInput>,
) -> AppResult<HttpResponse> {
    let report = state
        .reports
        .create(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Created().json(report))
}

#[get("/{report_id}")]
pub async fn get_report(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let report = state.reports.get(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(report))
}

#[put("/{report_id}")]
pub async fn update_report(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<UpdateReportInput>,
) -> AppResult<HttpResponse> {
    let report = state
        .reports
        .update(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Ok().json(report))
}

#[delete("/{report_id}")]
pub async fn delete_report(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.reports.delete(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Run a saved report against the project's current tasks
#[post("/{report_id}/generate")]
pub async fn generate_report(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let generated = state.reports.generate(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(generated))
}

use crate::{error::AppResult, services::auth::Claims, state::AppState};
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[post("/signup")]
pub async fn signup(
    state: web::Data<AppState>,
    item: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let payload = state.auth.signup(&item.email, &item.name, &item.password)?;
    Ok(HttpResponse::Created().json(payload))
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    item: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let payload = state.auth.login(&item.email, &item.password)?;
    Ok(HttpResponse::Ok().json(payload))
}

#[get("/me")]
pub async fn me(state: web::Data<AppState>, claims: Claims) -> AppResult<HttpResponse> {
    let user = state.auth.me(claims.user_id()?)?;
    Ok(HttpResponse::Ok().json(user))
}

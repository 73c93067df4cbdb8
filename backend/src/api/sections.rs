use crate::{
    error::AppResult,
    services::{
        auth::Claims,
        sections::{CreateSectionInput, UpdateSectionInput},
    },
    state::AppState,
};
use actix_web::{HttpResponse, delete, get, post, put, web};

#[get("/{project_id}/sections")]
pub async fn list_sections(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let sections = state.sections.list(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::Ok().json(sections))
}

#[post("/{project_id}/sections")]
pub async fn create_section(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<CreateSectionInput>,
) -> AppResult<HttpResponse> {
    let section = state
        .sections
        .create(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Created().json(section))
}

#[put("/{section_id}")]
pub async fn update_section(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
    item: web::Json<UpdateSectionInput>,
) -> AppResult<HttpResponse> {
    let section = state
        .sections
        .update(claims.user_id()?, path.into_inner(), item.into_inner())?;
    Ok(HttpResponse::Ok().json(section))
}

#[delete("/{section_id}")]
pub async fn delete_section(
    state: web::Data<AppState>,
    claims: Claims,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.sections.delete(claims.user_id()?, path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_section_position_is_optional() {
        let input: CreateSectionInput = serde_json::from_str(r#"{"name": "Doing"}"#).unwrap();
        assert_eq!(input.name, "Doing");
        assert_eq!(input.position, None);
    }

    #[test]
    fn test_update_section_partial() {
        let input: UpdateSectionInput = serde_json::from_str(r#"{"position": 3}"#).unwrap();
        assert_eq!(input.name, None);
        assert_eq!(input.position, Some(3));
    }
}

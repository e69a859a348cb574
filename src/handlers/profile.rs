use actix_web::{get, put, web, HttpResponse, Responder};

use crate::{
    dto::UpdateProfileDto,
    errors::AppError,
    models::Role,
    service::{self, auth::Caller},
    state::AppState,
};

#[get("")]
pub async fn list(caller: Caller, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let actor = service::account::resolve(state.store.as_ref(), &caller).await?;
    Ok(HttpResponse::Ok().json(actor.profiles))
}

#[put("/{role}")]
pub async fn update(
    caller: Caller,
    role: web::Path<String>,
    dto: web::Json<UpdateProfileDto>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let role: Role = role.parse()?;
    let profile = service::account::update_profile(state.store.as_ref(), &caller, role, dto.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/profiles").service(list).service(update));
}

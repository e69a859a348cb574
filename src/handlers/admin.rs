use actix_web::{delete, get, post, web, HttpResponse, Responder};
use log::info;
use uuid::Uuid;

use crate::{
    dto::{BulkApproveResponse, DenyEventDto},
    errors::AppError,
    models::Capabilities,
    service::{self, account::Actor, auth::Caller},
    state::AppState,
};

async fn reviewer(caller: &Caller, state: &AppState) -> Result<Actor, AppError> {
    service::account::resolve(state.store.as_ref(), caller).await
}

#[get("/stats")]
pub async fn stats(caller: Caller, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let actor = reviewer(&caller, &state).await?;
    let stats = service::visibility::admin_stats(state.store.as_ref(), &actor).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[post("/events/approve-pending")]
pub async fn approve_pending(caller: Caller, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let actor = reviewer(&caller, &state).await?;
    let approved = service::event::approve_all_pending(&state, &actor).await?;
    Ok(HttpResponse::Ok().json(BulkApproveResponse { approved }))
}

#[get("/events/{id}")]
pub async fn audit(caller: Caller, id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let actor = reviewer(&caller, &state).await?;
    let event = service::visibility::audit_get(state.store.as_ref(), &actor, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[post("/events/{id}/approve")]
pub async fn approve(caller: Caller, id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let actor = reviewer(&caller, &state).await?;
    let event = service::event::approve(&state, &actor, id.into_inner()).await?;
    info!("RESPONSE /ADMIN/EVENTS/{}/APPROVE", event.id);
    Ok(HttpResponse::Ok().json(event))
}

#[post("/events/{id}/deny")]
pub async fn deny(
    caller: Caller,
    id: web::Path<Uuid>,
    dto: web::Json<DenyEventDto>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let actor = reviewer(&caller, &state).await?;
    let event = service::event::deny(state.store.as_ref(), &actor, id.into_inner(), &dto.denial_reason).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[post("/events/{id}/feature")]
pub async fn feature(caller: Caller, id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let actor = reviewer(&caller, &state).await?;
    let featured = service::event::feature(state.store.as_ref(), &actor, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "featured": featured })))
}

#[delete("/events/{id}")]
pub async fn delete(caller: Caller, id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let actor = reviewer(&caller, &state).await?;
    actor.require(
        Capabilities::REVIEW_EVENTS,
        "Only administrators can delete events from the review queue.",
    )?;
    let event = service::event::soft_delete(state.store.as_ref(), &actor, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(stats)
            .service(approve_pending)
            .service(audit)
            .service(approve)
            .service(deny)
            .service(feature)
            .service(delete),
    );
}

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{
    dto::{NewEventDto, UpdateEventDto},
    errors::AppError,
    service::{self, auth::Caller},
    state::AppState,
};

#[get("/feed")]
pub async fn feed(caller: Caller, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let store = state.store.as_ref();
    let mut actor = service::account::resolve(store, &caller).await?;
    let events = service::visibility::list_for_student(store, &mut actor).await?;
    Ok(HttpResponse::Ok().json(events))
}

#[get("/dashboard")]
pub async fn dashboard(caller: Caller, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let store = state.store.as_ref();
    let mut actor = service::account::resolve(store, &caller).await?;
    let dashboard = service::visibility::list_for_organizer(store, &mut actor).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

#[post("")]
pub async fn create(
    caller: Caller,
    new_event_dto: web::Json<NewEventDto>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let store = state.store.as_ref();
    let actor = service::account::resolve(store, &caller).await?;
    let event = service::event::create(store, &actor, new_event_dto.into_inner()).await?;
    Ok(HttpResponse::Created().json(event))
}

#[get("/{id}")]
pub async fn get_by_id(id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let event = service::visibility::event_detail(state.store.as_ref(), id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[put("/{id}")]
pub async fn update(
    caller: Caller,
    id: web::Path<Uuid>,
    update_event_dto: web::Json<UpdateEventDto>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let store = state.store.as_ref();
    let actor = service::account::resolve(store, &caller).await?;
    let event = service::event::update(store, &actor, id.into_inner(), update_event_dto.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[delete("/{id}")]
pub async fn delete(caller: Caller, id: web::Path<Uuid>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let store = state.store.as_ref();
    let actor = service::account::resolve(store, &caller).await?;
    let event = service::event::soft_delete(store, &actor, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .service(feed)
            .service(dashboard)
            .service(create)
            .service(get_by_id)
            .service(update)
            .service(delete),
    );
}

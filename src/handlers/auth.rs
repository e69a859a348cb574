use actix_web::{post, web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info};

use crate::{
    dto::{LoginRequest, LogoutRequest, LogoutTokenResponse, NewAccountDto},
    errors::AppError,
    service::{self, auth::Caller},
    state::AppState,
};

#[post("/signup")]
pub async fn signup(dto: web::Json<NewAccountDto>, state: web::Data<AppState>) -> impl Responder {
    let response = service::account::signup(state.store.as_ref(), dto.into_inner()).await;
    match response {
        Ok(account) => {
            info!("RESPONSE /AUTH/SIGNUP: {}", account.id);
            HttpResponse::Created().json(account)
        }
        Err(err) => {
            error!("[{} : {}] signup failed: {}", file!(), line!(), err);
            HttpResponse::from_error(err)
        }
    }
}

#[post("/login")]
pub async fn login(dto: web::Json<LoginRequest>, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let response = service::account::login(&state, dto.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/logout-token")]
pub async fn logout_token(caller: Caller, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let (logout_token, expires_at) = state.sessions.issue_logout_token(caller.session_id, Utc::now())?;
    Ok(HttpResponse::Ok().json(LogoutTokenResponse {
        logout_token,
        expires_at,
    }))
}

#[post("/logout")]
pub async fn logout(
    caller: Caller,
    dto: web::Json<LogoutRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state
        .sessions
        .close(caller.session_id, dto.logout_token.trim(), Utc::now())?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(login)
            .service(logout_token)
            .service(logout),
    );
}

use std::future::{ready, Ready};

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, FromRequest, HttpMessage, HttpRequest,
};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use log::warn;
use uuid::Uuid;

use crate::{errors::AppError, state::AppState};

/// Identity of the caller, attached to the request by [`AuthMiddleware`].
#[derive(Debug, Clone)]
pub struct Caller {
    pub account_id: Uuid,
    pub email: String,
    pub session_id: Uuid,
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Caller>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("authentication required".to_string())),
        )
    }
}

/// Resolves a bearer token into a [`Caller`]. Requests without a usable
/// token (absent, malformed, expired or for an ended session) pass through
/// anonymously, and routes that need a [`Caller`] answer 401.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(Some(caller)) => {
                req.extensions_mut().insert(caller);
            }
            Ok(None) => {}
            Err(err) => {
                warn!("ignoring credentials on {} {}: {}", req.method(), req.uri(), err);
            }
        }
        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Option<Caller>, AppError> {
    let token = match jwt::parse_request(req, "Bearer ")? {
        Some(token) => token,
        None => return Ok(None),
    };
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or(AppError::InternalError)?;
    let claims = jwt::decode_claims(&state.config.jwt_secret, &token)?;
    if !state.sessions.is_active(claims.sid, claims.sub, Utc::now()) {
        return Err(AppError::Unauthorized("session has ended".to_string()));
    }
    Ok(Some(Caller {
        account_id: claims.sub,
        email: claims.email,
        session_id: claims.sid,
    }))
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::{DateTime, Utc};
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use uuid::Uuid;

    use crate::{dto::Claims, errors::AppError, models::Account};

    pub fn create(
        secret: &str,
        account: &Account,
        sid: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims::new(account, sid, Utc::now(), expires_at);
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(secret.as_bytes());
        Ok(encode(&header, &claims, &key)?)
    }

    pub fn decode_claims(secret: &str, token: &str) -> Result<Claims, AppError> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Ok(decode::<Claims>(token, &key, &validation)?.claims)
    }

    /// Token from the `Authorization` header, `None` when the header is absent.
    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Result<Option<String>, AppError> {
        let Some(auth_header) = req.headers().get(actix_web::http::header::AUTHORIZATION) else {
            return Ok(None);
        };
        auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(prefix))
            .map(|token| Some(token.trim().to_string()))
            .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))
    }

}

pub mod admin;
pub mod auth;
pub mod event;
pub mod profile;

use actix_web::web;

use crate::errors::AppError;

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::validation(format!("invalid request body: {err}")).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::validation(format!("invalid path: {err}")).into())
}

/// Registers every route on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .configure(auth::config)
        .configure(event::config)
        .configure(profile::config)
        .configure(admin::config);
}

#[cfg(test)]
mod tests;

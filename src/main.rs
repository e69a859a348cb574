pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;
pub mod state;

use std::io;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};
use sqlx::{postgres::Postgres, Pool};

use config::Config;
use db::{init_db_pool, EventStore, MemoryStore, PgStore};
use errors::AppError;
use service::{auth::AuthMiddleware, log::LoggerMiddleware};
use state::AppState;

type PGPool = Pool<Postgres>;

fn io_error(err: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    service::log::init_logger();

    let config = Config::from_env().map_err(io_error)?;

    let store: Arc<dyn EventStore> = match &config.database_url {
        Some(db_url) => {
            let pool: PGPool = init_db_pool(db_url, config.db_max_connections)
                .await
                .map_err(io_error)?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL is not set, events are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        service::account::ensure_admin(store.as_ref(), email, password)
            .await
            .map_err(io_error)?;
    }

    let bind = (config.host.clone(), config.port);
    let state = web::Data::new(AppState::new(config, store));

    info!("listening on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware)
            .wrap(LoggerMiddleware)
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await
}

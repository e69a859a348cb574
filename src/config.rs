use std::env;
use std::str::FromStr;

use chrono::Duration;
use dotenv::dotenv;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Absent means the in-process store is used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub logout_token_ttl: Duration,
    /// Prefix turning a stored flyer key into a public reference.
    pub media_base_url: String,
    pub styling_seed: Option<u64>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        let jwt_secret = env::var("JWT_ACCESS_SECRET")
            .map_err(|_| AppError::InvalidConfig("JWT_ACCESS_SECRET must be set".to_string()))?;
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080)?,
            database_url: optional("DATABASE_URL"),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            access_token_ttl: Duration::seconds(parse_or("ACCESS_TOKEN_TTL_SECS", 60 * 60)?),
            logout_token_ttl: Duration::seconds(parse_or("LOGOUT_TOKEN_TTL_SECS", 5 * 60)?),
            media_base_url: env::var("MEDIA_BASE_URL").unwrap_or_else(|_| "/media/".to_string()),
            styling_seed: optional("STYLING_SEED")
                .map(|v| parse_value("STYLING_SEED", &v))
                .transpose()?,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match optional(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidConfig(format!("{key} has an invalid value '{raw}'")))
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            access_token_ttl: Duration::minutes(10),
            logout_token_ttl: Duration::minutes(1),
            media_base_url: "https://cdn.campus.test/media/".to_string(),
            styling_seed: Some(7),
            admin_email: Some("admin@campus.test".to_string()),
            admin_password: Some("admin-pass".to_string()),
        }
    }
}

use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{errors::AppError, models::Account, PGPool};

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    display_name: String,
    pwd_hash: String,
    pwd_salt: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            pwd_hash: row.pwd_hash,
            pwd_salt: row.pwd_salt,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

pub async fn create(account: &Account, pool: &PGPool) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO accounts (id, email, display_name, pwd_hash, pwd_salt, is_admin, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(account.id)
    .bind(&account.email)
    .bind(&account.display_name)
    .bind(&account.pwd_hash)
    .bind(&account.pwd_salt)
    .bind(account.is_admin)
    .bind(account.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Account, AppError> {
    let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(row.into())
}

pub async fn find_by_email(email: &str, pool: &PGPool) -> Result<Option<Account>, AppError> {
    let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Account::from))
}

pub async fn count(pool: &PGPool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

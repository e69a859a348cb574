use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{Profile, Role},
    PGPool,
};

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    account_id: Uuid,
    role: String,
    contact_number: Option<String>,
    avatar: Option<String>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: row.id,
            account_id: row.account_id,
            role: row.role.parse()?,
            contact_number: row.contact_number,
            avatar: row.avatar,
        })
    }
}

/// Inserts the profile unless the (account, role) pair already exists.
pub async fn get_or_create(account_id: Uuid, role: Role, pool: &PGPool) -> Result<(Profile, bool), AppError> {
    let candidate = Profile::new(account_id, role);
    let inserted = sqlx::query(
        "INSERT INTO profiles (id, account_id, role) VALUES ($1, $2, $3)
        ON CONFLICT (account_id, role) DO NOTHING",
    )
    .bind(candidate.id)
    .bind(account_id)
    .bind(role.as_str())
    .execute(pool)
    .await?
    .rows_affected()
        > 0;

    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT * FROM profiles WHERE account_id = $1 AND role = $2",
    )
    .bind(account_id)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    Ok((row.try_into()?, inserted))
}

pub async fn list_for_account(account_id: Uuid, pool: &PGPool) -> Result<Vec<Profile>, AppError> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT * FROM profiles WHERE account_id = $1 ORDER BY role",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Profile::try_from).collect()
}

pub async fn update_contact(
    profile_id: Uuid,
    contact_number: Option<&str>,
    avatar: Option<&str>,
    pool: &PGPool,
) -> Result<Profile, AppError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "UPDATE profiles
        SET contact_number = COALESCE($2, contact_number), avatar = COALESCE($3, avatar)
        WHERE id = $1
        RETURNING *",
    )
    .bind(profile_id)
    .bind(contact_number)
    .bind(avatar)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

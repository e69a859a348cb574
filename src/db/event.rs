use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{prelude::FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::EventFilter,
    errors::AppError,
    models::{Event, EventStatus, Styling},
    PGPool,
};

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    organizer_id: Uuid,
    title: String,
    description: String,
    category: String,
    date: NaiveDate,
    time: NaiveTime,
    location: String,
    event_link: String,
    flyer: Option<String>,
    additional_details: Option<String>,
    contact_email: Option<String>,
    requirements: Option<String>,
    prizes: Option<String>,
    status: String,
    denial_reason: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
    featured_image: Option<String>,
    color_theme: Option<String>,
    styling_applied: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            description: row.description,
            category: row.category.parse()?,
            date: row.date,
            time: row.time,
            location: row.location,
            event_link: row.event_link,
            flyer: row.flyer,
            additional_details: row.additional_details,
            contact_email: row.contact_email,
            requirements: row.requirements,
            prizes: row.prizes,
            status: row.status.parse()?,
            denial_reason: row.denial_reason,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
            featured_image: row.featured_image,
            color_theme: row.color_theme,
            styling_applied: row.styling_applied,
            is_featured: row.is_featured,
            created_at: row.created_at,
        })
    }
}

pub async fn create(event: &Event, pool: &PGPool) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO events (id, organizer_id, title, description, category, date, time, location,
            event_link, flyer, additional_details, contact_email, requirements, prizes, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(event.id)
    .bind(event.organizer_id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.category.as_str())
    .bind(event.date)
    .bind(event.time)
    .bind(&event.location)
    .bind(&event.event_link)
    .bind(&event.flyer)
    .bind(&event.additional_details)
    .bind(&event.contact_email)
    .bind(&event.requirements)
    .bind(&event.prizes)
    .bind(event.status.as_str())
    .bind(event.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

// /events/id
pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Event, AppError> {
    let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => AppError::not_found("Event not found."),
            other => other.into(),
        })?;
    row.try_into()
}

pub async fn update(event: &Event, pool: &PGPool) -> Result<(), AppError> {
    let res = sqlx::query(
        "UPDATE events SET title = $2, description = $3, category = $4, date = $5, time = $6,
            location = $7, event_link = $8, flyer = $9, additional_details = $10, contact_email = $11,
            requirements = $12, prizes = $13, status = $14, denial_reason = $15
        WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(event.id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.category.as_str())
    .bind(event.date)
    .bind(event.time)
    .bind(&event.location)
    .bind(&event.event_link)
    .bind(&event.flyer)
    .bind(&event.additional_details)
    .bind(&event.contact_email)
    .bind(&event.requirements)
    .bind(&event.prizes)
    .bind(event.status.as_str())
    .bind(&event.denial_reason)
    .execute(pool)
    .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::conflict("Event has been deleted and cannot be edited."));
    }
    Ok(())
}

pub async fn set_status(
    id: Uuid,
    status: EventStatus,
    denial_reason: Option<&str>,
    pool: &PGPool,
) -> Result<(), AppError> {
    sqlx::query("UPDATE events SET status = $2, denial_reason = $3 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .bind(denial_reason)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn apply_styling(id: Uuid, styling: &Styling, pool: &PGPool) -> Result<bool, AppError> {
    let res = sqlx::query(
        "UPDATE events
        SET featured_image = $2, color_theme = $3, is_featured = is_featured OR $4, styling_applied = TRUE
        WHERE id = $1 AND styling_applied = FALSE",
    )
    .bind(id)
    .bind(&styling.featured_image)
    .bind(&styling.color_theme)
    .bind(styling.is_featured)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn set_featured(id: Uuid, featured: bool, pool: &PGPool) -> Result<(), AppError> {
    sqlx::query("UPDATE events SET is_featured = $2 WHERE id = $1")
        .bind(id)
        .bind(featured)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn soft_delete(id: Uuid, actor: Uuid, at: DateTime<Utc>, pool: &PGPool) -> Result<bool, AppError> {
    let res = sqlx::query(
        "UPDATE events SET deleted_at = $2, deleted_by = $3 WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(at)
    .bind(actor)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a EventFilter) {
    builder.push(" WHERE TRUE");
    if !filter.include_deleted {
        builder.push(" AND deleted_at IS NULL");
    }
    if let Some(status) = &filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(organizer) = filter.organizer {
        builder.push(" AND organizer_id = ").push_bind(organizer);
    }
}

pub async fn filter(filter: &EventFilter, pool: &PGPool) -> Result<Vec<Event>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM events");
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY date DESC, time DESC, created_at DESC");
    let rows = builder
        .build_query_as::<EventRow>()
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Event::try_from).collect()
}

pub async fn count(filter: &EventFilter, pool: &PGPool) -> Result<i64, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM events");
    push_filter(&mut builder, filter);
    let count: i64 = builder.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

pub mod account;
pub mod event;
pub mod memory;
pub mod profile;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Account, Event, EventStatus, Profile, Role, Styling};
use crate::PGPool;

pub use memory::MemoryStore;

pub async fn init_db_pool(db_url: &str, max_connections: u32) -> Result<PGPool, AppError> {
    let pool: PGPool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;
    info!("connected to postgresql");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("migrations applied");
    Ok(pool)
}

/// Which events a listing should return. Results are always ordered by
/// date, then time, newest first.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub organizer: Option<Uuid>,
    pub include_deleted: bool,
}

impl EventFilter {
    /// Live events only.
    pub fn active() -> Self {
        Self::default()
    }

    pub fn everything() -> Self {
        Self {
            include_deleted: true,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn for_organizer(mut self, profile_id: Uuid) -> Self {
        self.organizer = Some(profile_id);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        (self.include_deleted || !event.is_deleted())
            && self.status.map_or(true, |s| event.status == s)
            && self.organizer.map_or(true, |o| event.organizer_id == o)
    }
}

/// Persistence for accounts, profiles and events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_account(&self, account: &Account) -> Result<(), AppError>;
    async fn get_account(&self, id: Uuid) -> Result<Account, AppError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn count_accounts(&self) -> Result<i64, AppError>;

    /// Returns the profile and whether it was created by this call.
    async fn ensure_profile(&self, account_id: Uuid, role: Role) -> Result<(Profile, bool), AppError>;
    async fn list_profiles(&self, account_id: Uuid) -> Result<Vec<Profile>, AppError>;
    async fn update_profile_contact(
        &self,
        profile_id: Uuid,
        contact_number: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Profile, AppError>;

    async fn insert_event(&self, event: &Event) -> Result<(), AppError>;
    async fn get_event(&self, id: Uuid) -> Result<Event, AppError>;
    /// Writes organizer-editable fields plus status and denial reason.
    /// Fails with a conflict when the event has been deleted.
    async fn update_event(&self, event: &Event) -> Result<(), AppError>;
    async fn set_status(
        &self,
        id: Uuid,
        status: EventStatus,
        denial_reason: Option<&str>,
    ) -> Result<(), AppError>;
    /// Check-then-set on `styling_applied`. Returns `false` when the event
    /// was already styled, in which case nothing is written.
    async fn apply_styling(&self, id: Uuid, styling: &Styling) -> Result<bool, AppError>;
    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<(), AppError>;
    /// Returns `false` when the event was already deleted.
    async fn soft_delete(&self, id: Uuid, actor: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, AppError>;
    async fn count_events(&self, filter: &EventFilter) -> Result<i64, AppError>;
}

pub struct PgStore {
    pool: PGPool,
}

impl PgStore {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn create_account(&self, account: &Account) -> Result<(), AppError> {
        account::create(account, &self.pool).await
    }

    async fn get_account(&self, id: Uuid) -> Result<Account, AppError> {
        account::get_by_id(id, &self.pool).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        account::find_by_email(email, &self.pool).await
    }

    async fn count_accounts(&self) -> Result<i64, AppError> {
        account::count(&self.pool).await
    }

    async fn ensure_profile(&self, account_id: Uuid, role: Role) -> Result<(Profile, bool), AppError> {
        profile::get_or_create(account_id, role, &self.pool).await
    }

    async fn list_profiles(&self, account_id: Uuid) -> Result<Vec<Profile>, AppError> {
        profile::list_for_account(account_id, &self.pool).await
    }

    async fn update_profile_contact(
        &self,
        profile_id: Uuid,
        contact_number: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Profile, AppError> {
        profile::update_contact(profile_id, contact_number, avatar, &self.pool).await
    }

    async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        event::create(event, &self.pool).await
    }

    async fn get_event(&self, id: Uuid) -> Result<Event, AppError> {
        event::get_by_id(id, &self.pool).await
    }

    async fn update_event(&self, event: &Event) -> Result<(), AppError> {
        event::update(event, &self.pool).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: EventStatus,
        denial_reason: Option<&str>,
    ) -> Result<(), AppError> {
        event::set_status(id, status, denial_reason, &self.pool).await
    }

    async fn apply_styling(&self, id: Uuid, styling: &Styling) -> Result<bool, AppError> {
        event::apply_styling(id, styling, &self.pool).await
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<(), AppError> {
        event::set_featured(id, featured, &self.pool).await
    }

    async fn soft_delete(&self, id: Uuid, actor: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let marked = event::soft_delete(id, actor, at, &self.pool).await?;
        if !marked {
            warn!("event {} was already deleted", id);
        }
        Ok(marked)
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, AppError> {
        event::filter(filter, &self.pool).await
    }

    async fn count_events(&self, filter: &EventFilter) -> Result<i64, AppError> {
        event::count(filter, &self.pool).await
    }
}

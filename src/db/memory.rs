use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{EventFilter, EventStore};
use crate::errors::AppError;
use crate::models::{Account, Event, EventStatus, Profile, Role, Styling};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    profiles: HashMap<Uuid, Profile>,
    events: HashMap<Uuid, Event>,
}

/// In-process store, used when no `DATABASE_URL` is configured and in tests.
/// Every write takes the single table lock, so check-then-set operations are
/// atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn event_not_found() -> AppError {
    AppError::not_found("Event not found.")
}

fn sort_newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.time.cmp(&a.time))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_account(&self, account: &Account) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::conflict("record already exists"));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_account(&self, id: Uuid) -> Result<Account, AppError> {
        self.tables
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Account not found."))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn count_accounts(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.accounts.len() as i64)
    }

    async fn ensure_profile(&self, account_id: Uuid, role: Role) -> Result<(Profile, bool), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .profiles
            .values()
            .find(|p| p.account_id == account_id && p.role == role)
        {
            return Ok((existing.clone(), false));
        }
        if !tables.accounts.contains_key(&account_id) {
            return Err(AppError::not_found("Account not found."));
        }
        let profile = Profile::new(account_id, role);
        tables.profiles.insert(profile.id, profile.clone());
        Ok((profile, true))
    }

    async fn list_profiles(&self, account_id: Uuid) -> Result<Vec<Profile>, AppError> {
        let tables = self.tables.read().await;
        let mut profiles: Vec<Profile> = tables
            .profiles
            .values()
            .filter(|p| p.account_id == account_id)
            .cloned()
            .collect();
        profiles.sort_by_key(|p| p.role.as_str());
        Ok(profiles)
    }

    async fn update_profile_contact(
        &self,
        profile_id: Uuid,
        contact_number: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Profile, AppError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| AppError::not_found("Profile not found."))?;
        if let Some(number) = contact_number {
            profile.contact_number = Some(number.to_string());
        }
        if let Some(avatar) = avatar {
            profile.avatar = Some(avatar.to_string());
        }
        Ok(profile.clone())
    }

    async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.profiles.contains_key(&event.organizer_id) {
            return Err(AppError::not_found("Organizer profile not found."));
        }
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> Result<Event, AppError> {
        self.tables
            .read()
            .await
            .events
            .get(&id)
            .cloned()
            .ok_or_else(event_not_found)
    }

    async fn update_event(&self, event: &Event) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let stored = tables.events.get_mut(&event.id).ok_or_else(event_not_found)?;
        if stored.is_deleted() {
            return Err(AppError::conflict("Event has been deleted and cannot be edited."));
        }
        stored.title = event.title.clone();
        stored.description = event.description.clone();
        stored.category = event.category;
        stored.date = event.date;
        stored.time = event.time;
        stored.location = event.location.clone();
        stored.event_link = event.event_link.clone();
        stored.flyer = event.flyer.clone();
        stored.additional_details = event.additional_details.clone();
        stored.contact_email = event.contact_email.clone();
        stored.requirements = event.requirements.clone();
        stored.prizes = event.prizes.clone();
        stored.status = event.status;
        stored.denial_reason = event.denial_reason.clone();
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: EventStatus,
        denial_reason: Option<&str>,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let stored = tables.events.get_mut(&id).ok_or_else(event_not_found)?;
        stored.status = status;
        stored.denial_reason = denial_reason.map(str::to_string);
        Ok(())
    }

    async fn apply_styling(&self, id: Uuid, styling: &Styling) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let stored = tables.events.get_mut(&id).ok_or_else(event_not_found)?;
        if stored.styling_applied {
            return Ok(false);
        }
        stored.featured_image = Some(styling.featured_image.clone());
        stored.color_theme = Some(styling.color_theme.clone());
        stored.is_featured |= styling.is_featured;
        stored.styling_applied = true;
        Ok(true)
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let stored = tables.events.get_mut(&id).ok_or_else(event_not_found)?;
        stored.is_featured = featured;
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, actor: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let stored = tables.events.get_mut(&id).ok_or_else(event_not_found)?;
        if stored.is_deleted() {
            return Ok(false);
        }
        stored.deleted_at = Some(at);
        stored.deleted_by = Some(actor);
        Ok(true)
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, AppError> {
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        sort_newest_first(&mut events);
        Ok(events)
    }

    async fn count_events(&self, filter: &EventFilter) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.events.values().filter(|e| filter.matches(e)).count() as i64)
    }
}

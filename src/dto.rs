use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Account, Category, Event, EventStatus, Profile};

#[derive(Debug, Deserialize, Clone)]
pub struct NewAccountDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub account: Account,
    /// True when signing in created a missing student or organizer profile.
    pub profiles_created: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub sid: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(account: &Account, sid: Uuid, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: account.id,
            email: account.email.clone(),
            sid,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutTokenResponse {
    pub logout_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub logout_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewEventDto {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    #[serde(default)]
    pub event_link: String,
    pub flyer: Option<String>,
    pub additional_details: Option<String>,
    pub contact_email: Option<String>,
    pub requirements: Option<String>,
    pub prizes: Option<String>,
}

impl NewEventDto {
    pub fn into_event(self, organizer_id: Uuid, now: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            organizer_id,
            title: self.title,
            description: self.description,
            category: self.category,
            date: self.date,
            time: self.time,
            location: self.location,
            event_link: self.event_link,
            flyer: non_blank(self.flyer),
            additional_details: non_blank(self.additional_details),
            contact_email: non_blank(self.contact_email),
            requirements: non_blank(self.requirements),
            prizes: non_blank(self.prizes),
            status: EventStatus::Pending,
            denial_reason: None,
            deleted_at: None,
            deleted_by: None,
            featured_image: None,
            color_theme: None,
            styling_applied: false,
            is_featured: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateEventDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub event_link: Option<String>,
    pub flyer: Option<String>,
    pub additional_details: Option<String>,
    pub contact_email: Option<String>,
    pub requirements: Option<String>,
    pub prizes: Option<String>,
}

impl UpdateEventDto {
    /// Copies every provided field onto `event`; absent fields are left alone.
    pub fn apply_to(self, event: &mut Event) {
        if let Some(v) = self.title {
            event.title = v;
        }
        if let Some(v) = self.description {
            event.description = v;
        }
        if let Some(v) = self.category {
            event.category = v;
        }
        if let Some(v) = self.date {
            event.date = v;
        }
        if let Some(v) = self.time {
            event.time = v;
        }
        if let Some(v) = self.location {
            event.location = v;
        }
        if let Some(v) = self.event_link {
            event.event_link = v;
        }
        if self.flyer.is_some() {
            event.flyer = non_blank(self.flyer);
        }
        if self.additional_details.is_some() {
            event.additional_details = non_blank(self.additional_details);
        }
        if self.contact_email.is_some() {
            event.contact_email = non_blank(self.contact_email);
        }
        if self.requirements.is_some() {
            event.requirements = non_blank(self.requirements);
        }
        if self.prizes.is_some() {
            event.prizes = non_blank(self.prizes);
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DenyEventDto {
    #[serde(default)]
    pub denial_reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileDto {
    pub contact_number: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub denied: usize,
}

impl StatusCounts {
    pub fn tally(events: &[Event]) -> Self {
        events.iter().fold(Self::default(), |mut counts, event| {
            counts.total += 1;
            match event.status {
                EventStatus::Pending => counts.pending += 1,
                EventStatus::Approved => counts.approved += 1,
                EventStatus::Denied => counts.denied += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrganizerDashboard {
    pub profile: Profile,
    pub events: Vec<Event>,
    pub counts: StatusCounts,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminStats {
    pub events: i64,
    pub pending_events: i64,
    pub approved_events: i64,
    pub accounts: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkApproveResponse {
    pub approved: Vec<Uuid>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    #[serde(skip_serializing)]
    pub pwd_salt: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Organizer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Student, Role::Organizer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Organizer => "organizer",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Role::Student => Capabilities::BROWSE_EVENTS,
            Role::Organizer => Capabilities::MANAGE_OWN_EVENTS,
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "organizer" => Ok(Role::Organizer),
            other => Err(AppError::validation(format!("unknown role '{other}'"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// What an account may do, derived from its profiles and admin flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Capabilities: u8 {
        const BROWSE_EVENTS = 1;
        const MANAGE_OWN_EVENTS = 1 << 1;
        const REVIEW_EVENTS = 1 << 2;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub role: Role,
    pub contact_number: Option<String>,
    pub avatar: Option<String>,
}

impl Profile {
    pub fn new(account_id: Uuid, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            role,
            contact_number: None,
            avatar: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hackathon,
    Workshop,
    Internship,
    #[default]
    TechEvent,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Hackathon,
        Category::Workshop,
        Category::Internship,
        Category::TechEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hackathon => "hackathon",
            Category::Workshop => "workshop",
            Category::Internship => "internship",
            Category::TechEvent => "techevent",
        }
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hackathon" => Ok(Category::Hackathon),
            "workshop" => Ok(Category::Workshop),
            "internship" => Ok(Category::Internship),
            "techevent" => Ok(Category::TechEvent),
            other => Err(AppError::validation(format!("unknown category '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Denied => "denied",
        }
    }
}

impl FromStr for EventStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "denied" => Ok(EventStatus::Denied),
            other => Err(AppError::validation(format!("unknown status '{other}'"))),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub event_link: String,
    /// Storage reference of the organizer's uploaded flyer.
    pub flyer: Option<String>,
    pub additional_details: Option<String>,
    pub contact_email: Option<String>,
    pub requirements: Option<String>,
    pub prizes: Option<String>,
    pub status: EventStatus,
    pub denial_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub featured_image: Option<String>,
    pub color_theme: Option<String>,
    pub styling_applied: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_visible_to_students(&self) -> bool {
        self.status == EventStatus::Approved && !self.is_deleted()
    }

    /// The styling outputs, once they have been applied.
    pub fn styling(&self) -> Option<Styling> {
        if !self.styling_applied {
            return None;
        }
        Some(Styling {
            featured_image: self.featured_image.clone().unwrap_or_default(),
            color_theme: self.color_theme.clone().unwrap_or_default(),
            is_featured: self.is_featured,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Styling {
    pub featured_image: String,
    pub color_theme: String,
    pub is_featured: bool,
}

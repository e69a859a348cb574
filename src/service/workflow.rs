//! Event approval workflow.
//!
//! Pure functions over an in-memory [`Event`]: they validate a transition,
//! mutate the record and report what changed. Persisting the result is the
//! caller's job (see `service::event`).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{info, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use uuid::Uuid;

use crate::dto::UpdateEventDto;
use crate::errors::AppError;
use crate::models::{Category, Event, EventStatus};

/// Days on either side of today in which an approved event is featured.
pub const FEATURE_WINDOW_DAYS: i64 = 7;

pub struct CategoryStyle {
    pub color: &'static str,
    pub images: [&'static str; 3],
}

const HACKATHON: CategoryStyle = CategoryStyle {
    color: "#e74c3c",
    images: [
        "https://images.unsplash.com/photo-1556761175-5973dc0f32e7?w=400",
        "https://images.unsplash.com/photo-1517077304055-6e89abbf09b0?w=400",
        "https://images.unsplash.com/photo-1531297484001-80022131f5a1?w=400",
    ],
};

const WORKSHOP: CategoryStyle = CategoryStyle {
    color: "#3498db",
    images: [
        "https://images.unsplash.com/photo-1620712943543-2fd617224887?w=400",
        "https://images.unsplash.com/photo-1522202176988-66273c2fd55f?w=400",
        "https://images.unsplash.com/photo-1517180102446-f3ece451e9d8?w=400",
    ],
};

const INTERNSHIP: CategoryStyle = CategoryStyle {
    color: "#2ecc71",
    images: [
        "https://images.unsplash.com/photo-1521737711867-e3b97375f902?w=400",
        "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400",
        "https://images.unsplash.com/photo-1600880292203-757bb62b4baf?w=400",
    ],
};

const TECH_EVENT: CategoryStyle = CategoryStyle {
    color: "#9b59b6",
    images: [
        "https://images.unsplash.com/photo-1587825140708-df876c12b44e?w=400",
        "https://images.unsplash.com/photo-1519389950473-47ba0277781c?w=400",
        "https://images.unsplash.com/photo-1485827404703-89b55fcc595e?w=400",
    ],
};

pub fn style_for(category: Category) -> &'static CategoryStyle {
    match category {
        Category::Hackathon => &HACKATHON,
        Category::Workshop => &WORKSHOP,
        Category::Internship => &INTERNSHIP,
        Category::TechEvent => &TECH_EVENT,
    }
}

/// Inputs to styling that come from outside the event.
#[derive(Debug, Clone, Copy)]
pub struct StylingContext<'a> {
    pub today: NaiveDate,
    pub media_base_url: &'a str,
}

pub fn is_within_feature_window(date: NaiveDate, today: NaiveDate) -> bool {
    let window = Duration::days(FEATURE_WINDOW_DAYS);
    today - window <= date && date <= today + window
}

/// Public reference for a stored flyer. Absolute URLs pass through unchanged.
pub fn flyer_reference(flyer: &str, media_base_url: &str) -> String {
    if flyer.starts_with("http://") || flyer.starts_with("https://") {
        return flyer.to_string();
    }
    format!(
        "{}/{}",
        media_base_url.trim_end_matches('/'),
        flyer.trim_start_matches('/')
    )
}

fn validate_submission(event: &Event) -> Result<(), AppError> {
    if event.title.trim().is_empty() {
        return Err(AppError::validation("An event title is required."));
    }
    let link = event.event_link.trim();
    if link.is_empty() {
        return Err(AppError::validation(
            "A registration link or event website is required.",
        ));
    }
    if !(link.starts_with("http://") || link.starts_with("https://")) {
        return Err(AppError::validation(
            "The registration link must be an http(s) URL.",
        ));
    }
    Ok(())
}

fn ensure_not_deleted(event: &Event, action: &str) -> Result<(), AppError> {
    if event.is_deleted() {
        warn!("refusing to {} deleted event {}", action, event.id);
        return Err(AppError::conflict(format!(
            "Event \"{}\" has been deleted and cannot be {}.",
            event.title, action
        )));
    }
    Ok(())
}

/// Puts the event into review: status becomes pending and any previous
/// denial reason is dropped.
pub fn submit(event: &mut Event) -> Result<(), AppError> {
    ensure_not_deleted(event, "submitted")?;
    validate_submission(event)?;
    event.status = EventStatus::Pending;
    event.denial_reason = None;
    info!("event {} submitted for review", event.id);
    Ok(())
}

/// Applies organizer changes. A denied event goes back to pending; pending
/// and approved events keep their status.
pub fn edit(event: &mut Event, changes: UpdateEventDto) -> Result<(), AppError> {
    ensure_not_deleted(event, "edited")?;
    let mut edited = event.clone();
    changes.apply_to(&mut edited);
    validate_submission(&edited)?;
    if edited.status == EventStatus::Denied {
        submit(&mut edited)?;
        info!("denied event {} resubmitted after edit", edited.id);
    }
    *event = edited;
    Ok(())
}

/// Approves the event and styles it if it has not been styled yet.
///
/// Returns whether styling was applied by this call.
pub fn approve<R: Rng + ?Sized>(
    event: &mut Event,
    ctx: &StylingContext<'_>,
    rng: &mut R,
) -> Result<bool, AppError> {
    ensure_not_deleted(event, "approved")?;
    event.status = EventStatus::Approved;
    event.denial_reason = None;
    info!("event {} approved", event.id);
    Ok(apply_styling(event, ctx, rng))
}

pub fn deny(event: &mut Event, reason: &str) -> Result<(), AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("A denial reason is required."));
    }
    ensure_not_deleted(event, "denied")?;
    if event.status != EventStatus::Pending {
        warn!("refusing to deny event {} in status {}", event.id, event.status);
        return Err(AppError::conflict(format!(
            "Only pending events can be denied; this event is {}.",
            event.status
        )));
    }
    event.status = EventStatus::Denied;
    event.denial_reason = Some(reason.to_string());
    info!("event {} denied", event.id);
    Ok(())
}

/// Fills the styling fields once. Returns `false` without touching the
/// event when styling was already applied.
pub fn apply_styling<R: Rng + ?Sized>(
    event: &mut Event,
    ctx: &StylingContext<'_>,
    rng: &mut R,
) -> bool {
    if event.styling_applied {
        return false;
    }
    let style = style_for(event.category);
    let featured_image = match event.flyer.as_deref() {
        Some(flyer) => flyer_reference(flyer, ctx.media_base_url),
        None => style
            .images
            .choose(rng)
            .copied()
            .unwrap_or(style.images[0])
            .to_string(),
    };
    event.featured_image = Some(featured_image);
    event.color_theme = Some(style.color.to_string());
    if is_within_feature_window(event.date, ctx.today) {
        event.is_featured = true;
    }
    event.styling_applied = true;
    info!(
        "styling applied to event {} (featured: {})",
        event.id, event.is_featured
    );
    true
}

/// Marks the event deleted. Re-marking keeps the original marker and
/// returns `false`.
pub fn soft_delete(event: &mut Event, actor: Uuid, now: DateTime<Utc>) -> bool {
    if event.is_deleted() {
        info!("event {} already deleted, keeping original marker", event.id);
        return false;
    }
    event.deleted_at = Some(now);
    event.deleted_by = Some(actor);
    info!("event {} deleted by {}", event.id, actor);
    true
}

/// Marks an approved, live event as featured. Other events are skipped.
pub fn feature(event: &mut Event) -> bool {
    if !event.is_visible_to_students() {
        return false;
    }
    event.is_featured = true;
    true
}

//! Read-only projections over events. Nothing here writes to the store
//! except the lazy creation of a missing role profile.

use uuid::Uuid;

use crate::{
    db::{EventFilter, EventStore},
    dto::{AdminStats, OrganizerDashboard, StatusCounts},
    errors::AppError,
    models::{Capabilities, Event, EventStatus, Role},
    service::account::{self, Actor},
};

/// Approved, live events, newest first.
pub async fn list_for_student(store: &dyn EventStore, actor: &mut Actor) -> Result<Vec<Event>, AppError> {
    account::ensure_role(store, actor, Role::Student).await?;
    store
        .list_events(&EventFilter::active().with_status(EventStatus::Approved))
        .await
}

/// The organizer's live events in every status, with per-status counts.
pub async fn list_for_organizer(store: &dyn EventStore, actor: &mut Actor) -> Result<OrganizerDashboard, AppError> {
    let profile = account::ensure_role(store, actor, Role::Organizer).await?;
    let events = store
        .list_events(&EventFilter::active().for_organizer(profile.id))
        .await?;
    let counts = StatusCounts::tally(&events);
    Ok(OrganizerDashboard {
        profile,
        events,
        counts,
    })
}

/// Public detail page: only approved, live events are visible.
pub async fn event_detail(store: &dyn EventStore, id: Uuid) -> Result<Event, AppError> {
    let event = store.get_event(id).await?;
    if !event.is_visible_to_students() {
        return Err(AppError::not_found("Event not found."));
    }
    Ok(event)
}

/// Any event by id, deleted or not.
pub async fn audit_get(store: &dyn EventStore, actor: &Actor, id: Uuid) -> Result<Event, AppError> {
    actor.require(Capabilities::REVIEW_EVENTS, "Only administrators can audit events.")?;
    store.get_event(id).await
}

pub async fn admin_stats(store: &dyn EventStore, actor: &Actor) -> Result<AdminStats, AppError> {
    actor.require(Capabilities::REVIEW_EVENTS, "Only administrators can view statistics.")?;
    let everything = EventFilter::everything();
    Ok(AdminStats {
        events: store.count_events(&everything).await?,
        pending_events: store
            .count_events(&everything.clone().with_status(EventStatus::Pending))
            .await?,
        approved_events: store
            .count_events(&everything.clone().with_status(EventStatus::Approved))
            .await?,
        accounts: store.count_accounts().await?,
    })
}

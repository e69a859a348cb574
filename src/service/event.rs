use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    db::{EventFilter, EventStore},
    dto::{NewEventDto, UpdateEventDto},
    errors::AppError,
    models::{Capabilities, Event, EventStatus, Role},
    service::{account::Actor, workflow},
    state::AppState,
};

const ADMIN_ONLY: &str = "Only administrators can review events.";

fn owned_by(actor: &Actor, event: &Event) -> bool {
    actor
        .profile(Role::Organizer)
        .map_or(false, |p| p.id == event.organizer_id)
}

/// Creates an event owned by the caller's organizer profile and submits it
/// for review.
pub async fn create(store: &dyn EventStore, actor: &Actor, dto: NewEventDto) -> Result<Event, AppError> {
    actor.require(
        Capabilities::MANAGE_OWN_EVENTS,
        "You must have an organizer profile to create events.",
    )?;
    let organizer = actor
        .profile(Role::Organizer)
        .ok_or_else(|| AppError::forbidden("You must have an organizer profile to create events."))?;
    let mut event = dto.into_event(organizer.id, Utc::now());
    workflow::submit(&mut event)?;
    store.insert_event(&event).await?;
    info!("event {} created by organizer {}", event.id, organizer.id);
    Ok(event)
}

/// Organizer edit. Editing a denied event resubmits it for review.
pub async fn update(
    store: &dyn EventStore,
    actor: &Actor,
    id: Uuid,
    changes: UpdateEventDto,
) -> Result<Event, AppError> {
    let mut event = store.get_event(id).await?;
    if !owned_by(actor, &event) {
        warn!("account {} tried to edit event {} it does not own", actor.account_id, id);
        return Err(AppError::forbidden("You can only edit your own events."));
    }
    workflow::edit(&mut event, changes)?;
    store.update_event(&event).await?;
    info!("event {} updated, status {}", event.id, event.status);
    Ok(event)
}

/// Soft-deletes an event. Owners may delete their own events, administrators
/// any event. Deleting twice keeps the first marker.
pub async fn soft_delete(store: &dyn EventStore, actor: &Actor, id: Uuid) -> Result<Event, AppError> {
    let mut event = store.get_event(id).await?;
    if !(owned_by(actor, &event) || actor.is_admin()) {
        return Err(AppError::forbidden("You can only delete your own events."));
    }
    let now = Utc::now();
    if workflow::soft_delete(&mut event, actor.account_id, now)
        && !store.soft_delete(id, actor.account_id, now).await?
    {
        event = store.get_event(id).await?;
    }
    Ok(event)
}

/// Approves and, on first approval, styles the event.
pub async fn approve(state: &AppState, actor: &Actor, id: Uuid) -> Result<Event, AppError> {
    actor.require(Capabilities::REVIEW_EVENTS, ADMIN_ONLY)?;
    let store = state.store.as_ref();
    let mut event = store.get_event(id).await?;
    let styled = state.approve(&mut event)?;
    store.set_status(id, EventStatus::Approved, None).await?;
    if let Some(styling) = event.styling().filter(|_| styled) {
        if !store.apply_styling(id, &styling).await? {
            info!("event {} was styled by a concurrent approval", id);
            event = store.get_event(id).await?;
        }
    }
    Ok(event)
}

pub async fn deny(store: &dyn EventStore, actor: &Actor, id: Uuid, reason: &str) -> Result<Event, AppError> {
    actor.require(Capabilities::REVIEW_EVENTS, ADMIN_ONLY)?;
    if reason.trim().is_empty() {
        return Err(AppError::validation("A denial reason is required."));
    }
    let mut event = store.get_event(id).await?;
    workflow::deny(&mut event, reason)?;
    store
        .set_status(id, event.status, event.denial_reason.as_deref())
        .await?;
    Ok(event)
}

/// Marks an approved event as featured. Returns whether it was marked.
pub async fn feature(store: &dyn EventStore, actor: &Actor, id: Uuid) -> Result<bool, AppError> {
    actor.require(Capabilities::REVIEW_EVENTS, ADMIN_ONLY)?;
    let mut event = store.get_event(id).await?;
    if !workflow::feature(&mut event) {
        info!("event {} not featured: not approved or deleted", id);
        return Ok(false);
    }
    store.set_featured(id, true).await?;
    Ok(true)
}

/// Approves every pending, live event. Returns the approved ids.
pub async fn approve_all_pending(state: &AppState, actor: &Actor) -> Result<Vec<Uuid>, AppError> {
    actor.require(Capabilities::REVIEW_EVENTS, ADMIN_ONLY)?;
    let pending = state
        .store
        .list_events(&EventFilter::active().with_status(EventStatus::Pending))
        .await?;
    let approved = approve_each(state, actor, pending.iter().map(|e| e.id)).await?;
    info!("{} pending events approved", approved.len());
    Ok(approved)
}

/// Approves each event on its own. Events deleted or gone by the time they
/// are reached are skipped; any other failure stops the batch.
async fn approve_each(
    state: &AppState,
    actor: &Actor,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<Vec<Uuid>, AppError> {
    let mut approved = Vec::new();
    for id in ids {
        match approve(state, actor, id).await {
            Ok(_) => approved.push(id),
            Err(err @ (AppError::Conflict(_) | AppError::NotFound(_))) => {
                warn!("skipping event {} in bulk approval: {}", id, err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(approved)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dto::NewAccountDto;
    use crate::service::account::{self, tests::state};
    use chrono::{Duration, NaiveTime};

    pub(crate) async fn organizer(state: &AppState, email: &str) -> Actor {
        let account = account::signup(
            state.store.as_ref(),
            NewAccountDto {
                name: "Organizer".to_string(),
                email: email.to_string(),
                password: "pw".to_string(),
                confirm_password: "pw".to_string(),
            },
        )
        .await
        .unwrap();
        let profiles = state.store.list_profiles(account.id).await.unwrap();
        Actor::from_parts(&account, profiles)
    }

    pub(crate) async fn admin(state: &AppState) -> Actor {
        account::ensure_admin(state.store.as_ref(), "admin@campus.test", "pw")
            .await
            .unwrap();
        let account = state
            .store
            .find_account_by_email("admin@campus.test")
            .await
            .unwrap()
            .unwrap();
        Actor::from_parts(&account, vec![])
    }

    pub(crate) fn new_event(days_from_today: i64, category: &str, flyer: Option<&str>) -> NewEventDto {
        NewEventDto {
            title: "Intro to Rust".to_string(),
            description: "Ownership in an afternoon".to_string(),
            category: category.parse().unwrap(),
            date: Utc::now().date_naive() + Duration::days(days_from_today),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            location: "Lab 3".to_string(),
            event_link: "https://register.campus.test/rust".to_string(),
            flyer: flyer.map(str::to_string),
            additional_details: None,
            contact_email: None,
            requirements: None,
            prizes: None,
        }
    }

    #[actix_rt::test]
    async fn create_requires_registration_link() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let mut dto = new_event(3, "workshop", None);
        dto.event_link = String::new();

        let err = create(state.store.as_ref(), &org, dto).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(state.store.count_events(&EventFilter::everything()).await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn workshop_approval_scenario() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let admin = admin(&state).await;
        let event = create(state.store.as_ref(), &org, new_event(3, "workshop", None)).await.unwrap();
        assert_eq!(event.status, EventStatus::Pending);

        let approved = approve(&state, &admin, event.id).await.unwrap();
        let stored = state.store.get_event(event.id).await.unwrap();

        assert_eq!(stored, approved);
        assert_eq!(stored.status, EventStatus::Approved);
        assert_eq!(stored.color_theme.as_deref(), Some("#3498db"));
        assert!(stored.is_featured);
        let image = stored.featured_image.unwrap();
        assert!(workflow::style_for(stored.category).images.contains(&image.as_str()));
    }

    #[actix_rt::test]
    async fn techevent_with_flyer_scenario() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let admin = admin(&state).await;
        let flyer = "https://uploads.campus.test/robotics.png";
        let event = create(state.store.as_ref(), &org, new_event(30, "techevent", Some(flyer)))
            .await
            .unwrap();

        approve(&state, &admin, event.id).await.unwrap();
        let stored = state.store.get_event(event.id).await.unwrap();

        assert_eq!(stored.featured_image.as_deref(), Some(flyer));
        assert!(!stored.is_featured);
    }

    #[actix_rt::test]
    async fn second_approval_keeps_styling() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let admin = admin(&state).await;
        let event = create(state.store.as_ref(), &org, new_event(1, "hackathon", None)).await.unwrap();

        let first = approve(&state, &admin, event.id).await.unwrap();
        let second = approve(&state, &admin, event.id).await.unwrap();

        assert_eq!(first.featured_image, second.featured_image);
        assert_eq!(first.color_theme, second.color_theme);
    }

    #[actix_rt::test]
    async fn organizers_cannot_review() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let event = create(state.store.as_ref(), &org, new_event(1, "workshop", None)).await.unwrap();

        assert!(matches!(
            approve(&state, &org, event.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            deny(state.store.as_ref(), &org, event.id, "no").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[actix_rt::test]
    async fn deny_then_edit_resubmits() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let admin = admin(&state).await;
        let event = create(state.store.as_ref(), &org, new_event(10, "internship", None)).await.unwrap();

        let denied = deny(state.store.as_ref(), &admin, event.id, "Add the stipend").await.unwrap();
        assert_eq!(denied.denial_reason.as_deref(), Some("Add the stipend"));

        let changes = UpdateEventDto {
            prizes: Some("Paid stipend".to_string()),
            ..Default::default()
        };
        let edited = update(state.store.as_ref(), &org, event.id, changes).await.unwrap();
        let stored = state.store.get_event(event.id).await.unwrap();

        assert_eq!(edited.status, EventStatus::Pending);
        assert_eq!(stored.status, EventStatus::Pending);
        assert_eq!(stored.denial_reason, None);
        assert_eq!(stored.prizes.as_deref(), Some("Paid stipend"));
    }

    #[actix_rt::test]
    async fn empty_denial_reason_leaves_event_pending() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let admin = admin(&state).await;
        let event = create(state.store.as_ref(), &org, new_event(10, "workshop", None)).await.unwrap();

        let err = deny(state.store.as_ref(), &admin, event.id, "").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        let stored = state.store.get_event(event.id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Pending);
    }

    #[actix_rt::test]
    async fn only_owner_or_admin_deletes() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let other = organizer(&state, "x@campus.test").await;
        let admin = admin(&state).await;
        let event = create(state.store.as_ref(), &org, new_event(2, "workshop", None)).await.unwrap();

        assert!(matches!(
            soft_delete(state.store.as_ref(), &other, event.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            update(state.store.as_ref(), &other, event.id, UpdateEventDto::default()).await,
            Err(AppError::Forbidden(_))
        ));

        let deleted = soft_delete(state.store.as_ref(), &org, event.id).await.unwrap();
        assert_eq!(deleted.deleted_by, Some(org.account_id));

        let again = soft_delete(state.store.as_ref(), &admin, event.id).await.unwrap();
        assert_eq!(again.deleted_by, Some(org.account_id));
        assert_eq!(again.deleted_at, deleted.deleted_at);

        assert!(matches!(
            update(state.store.as_ref(), &org, event.id, UpdateEventDto::default()).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            approve(&state, &admin, event.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn feature_and_bulk_approve() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let admin = admin(&state).await;
        let far = create(state.store.as_ref(), &org, new_event(90, "workshop", None)).await.unwrap();
        let near = create(state.store.as_ref(), &org, new_event(1, "hackathon", None)).await.unwrap();
        let gone = create(state.store.as_ref(), &org, new_event(2, "hackathon", None)).await.unwrap();
        soft_delete(state.store.as_ref(), &org, gone.id).await.unwrap();

        assert!(!feature(state.store.as_ref(), &admin, far.id).await.unwrap());

        let mut approved = approve_all_pending(&state, &admin).await.unwrap();
        approved.sort();
        let mut expected = vec![far.id, near.id];
        expected.sort();
        assert_eq!(approved, expected);

        assert!(feature(state.store.as_ref(), &admin, far.id).await.unwrap());
        assert!(state.store.get_event(far.id).await.unwrap().is_featured);
        assert_eq!(
            state.store.get_event(gone.id).await.unwrap().status,
            EventStatus::Pending
        );
    }

    #[actix_rt::test]
    async fn bulk_approval_skips_events_that_vanished() {
        let state = state();
        let org = organizer(&state, "o@campus.test").await;
        let admin = admin(&state).await;
        let first = create(state.store.as_ref(), &org, new_event(1, "workshop", None)).await.unwrap();
        let deleted = create(state.store.as_ref(), &org, new_event(2, "hackathon", None)).await.unwrap();
        let last = create(state.store.as_ref(), &org, new_event(3, "internship", None)).await.unwrap();
        soft_delete(state.store.as_ref(), &org, deleted.id).await.unwrap();

        let approved = approve_each(
            &state,
            &admin,
            [first.id, deleted.id, Uuid::new_v4(), last.id],
        )
        .await
        .unwrap();

        assert_eq!(approved, vec![first.id, last.id]);
        assert_eq!(
            state.store.get_event(last.id).await.unwrap().status,
            EventStatus::Approved
        );
        assert_eq!(
            state.store.get_event(deleted.id).await.unwrap().status,
            EventStatus::Pending
        );
    }

    #[actix_rt::test]
    async fn unknown_event_is_not_found() {
        let state = state();
        let admin = admin(&state).await;
        assert!(matches!(
            approve(&state, &admin, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}

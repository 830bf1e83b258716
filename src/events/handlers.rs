use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::dto::MessageResponse;
use crate::auth::extractors::{CurrentUser, RequireOrganizer};
use crate::auth::jwt::AuthUser;
use crate::auth::repo::User;
use crate::auth::services::is_unique_violation;
use crate::error::AppError;
use crate::notifications::repo::Notification;
use crate::state::AppState;
use crate::storage::allowed_extension;

use super::dto::{EventDetails, EventListQuery, EventPayload, UploadedImageResponse};
use super::repo::{Category, Event, EventFields, EventRegistration, EventStatus};
use super::rules::{self, EventSnapshot};

pub(crate) fn validate_payload(payload: &EventPayload) -> Result<(), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if payload.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".into()));
    }
    if payload.location.trim().is_empty() {
        return Err(AppError::Validation("Location is required".into()));
    }
    if payload.capacity <= 0 {
        return Err(AppError::Validation("Capacity must be positive".into()));
    }
    Ok(())
}

/// An omitted `status` falls back to `fallback_status`: `Draft` on create,
/// the stored status on edits so a partial edit never unpublishes an event.
pub(crate) fn fields_of(payload: &EventPayload, fallback_status: EventStatus) -> EventFields<'_> {
    EventFields {
        title: payload.title.trim(),
        description: &payload.description,
        location: payload.location.trim(),
        event_date: payload.event_date,
        registration_deadline: payload.registration_deadline,
        capacity: payload.capacity,
        status: payload.status.unwrap_or(fallback_status),
        category: payload.category.as_deref(),
    }
}

/// Creator or admin; everyone else gets a 403.
fn authorize_event_mutation(event: &Event, user: &User) -> Result<(), AppError> {
    if event.creator_id != user.id && !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "You do not have permission to modify this event.".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let page_size = state.config.events_page_size;
    let events = Event::list_published_upcoming(
        &state.db,
        &query.filter(),
        page_size,
        query.offset(page_size),
    )
    .await?;
    Ok(Json(events))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(Category::list(&state.db).await?))
}

#[instrument(skip(state, auth))]
pub async fn event_detail(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetails>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    let registered = EventRegistration::active_count_for_event(&state.db, event_id).await?;
    let is_registered = match auth {
        Some(AuthUser(user_id)) => Some(
            EventRegistration::find_active(&state.db, user_id, event_id)
                .await?
                .is_some(),
        ),
        None => None,
    };

    let now = OffsetDateTime::now_utc();
    let snapshot = EventSnapshot::from(&event);
    Ok(Json(EventDetails {
        registration_count: registered,
        available_spots: rules::available_spots(event.capacity, registered),
        is_full: rules::is_full(event.capacity, registered),
        is_registration_open: snapshot.is_registration_open(now),
        is_upcoming: snapshot.is_upcoming(now),
        is_registered,
        event,
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    RequireOrganizer(user): RequireOrganizer,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    validate_payload(&payload)?;
    let event = Event::create(&state.db, user.id, fields_of(&payload, EventStatus::Draft)).await?;
    info!(event_id = %event.id, creator = %user.id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<Event>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;
    authorize_event_mutation(&event, &user)?;
    validate_payload(&payload)?;

    let updated = Event::update(&state.db, event_id, fields_of(&payload, event.status)).await?;
    info!(event_id = %event_id, editor = %user.id, "event updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;
    authorize_event_mutation(&event, &user)?;

    if let Some(filename) = &event.image_filename {
        if let Err(e) = state.images.remove(filename).await {
            warn!(error = %e, %filename, "failed to remove event image");
        }
    }
    Event::delete(&state.db, event_id).await?;
    info!(event_id = %event_id, editor = %user.id, "event deleted");
    Ok(Json(MessageResponse::ok("Event deleted successfully.")))
}

#[instrument(skip(state, user))]
pub async fn register_for_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    let registered = EventRegistration::active_count_for_event(&state.db, event_id).await?;
    let already_registered = EventRegistration::find_active(&state.db, user.id, event_id)
        .await?
        .is_some();

    rules::check_admission(
        &EventSnapshot::from(&event),
        registered,
        user.id,
        already_registered,
        OffsetDateTime::now_utc(),
    )?;

    match EventRegistration::insert(&state.db, user.id, event_id).await {
        Ok(_) => {}
        // Two requests raced past the admission check; the unique index on
        // (user_id, event_id) caught the second one.
        Err(e) if is_unique_violation(&e) => {
            warn!(user_id = %user.id, %event_id, "registration lost uniqueness race");
            return Err(rules::AdmissionDenied::AlreadyRegistered.into());
        }
        Err(e) => return Err(e.into()),
    }

    if let Err(e) = Notification::create(
        &state.db,
        event.creator_id,
        "New registration",
        &format!("{} registered for {}.", user.full_name(), event.title),
        "info",
    )
    .await
    {
        warn!(error = %e, "failed to notify event creator");
    }

    info!(user_id = %user.id, %event_id, "user registered for event");
    Ok(Json(MessageResponse::ok(format!(
        "Successfully registered for {}!",
        event.title
    ))))
}

#[instrument(skip(state, user))]
pub async fn unregister_from_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    let removed = EventRegistration::delete_by_pair(&state.db, user.id, event_id).await?;
    if removed == 0 {
        // Unregistering without a registration is a no-op with a message,
        // not an error.
        return Ok(Json(MessageResponse::ok(
            "You are not registered for this event.",
        )));
    }

    info!(user_id = %user.id, %event_id, "user unregistered from event");
    Ok(Json(MessageResponse::ok(format!(
        "Successfully unregistered from {}.",
        event.title
    ))))
}

#[instrument(skip(state, user))]
pub async fn my_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(Event::list_by_creator(&state.db, user.id).await?))
}

#[instrument(skip(state, user))]
pub async fn registered_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(
        EventRegistration::registered_events(&state.db, user.id).await?,
    ))
}

#[instrument(skip(state, user, multipart))]
pub async fn upload_event_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadedImageResponse>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;
    authorize_event_mutation(&event, &user)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation("Image filename is required".into()))?;
        let ext = allowed_extension(&original_name).ok_or_else(|| {
            AppError::Validation("Only png, jpg, jpeg and gif files are allowed".into())
        })?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if data.len() > state.config.max_upload_bytes {
            return Err(AppError::Validation("Image is too large".into()));
        }

        let stored_name = format!("{}-{}.{}", event_id, Uuid::new_v4(), ext);
        state.images.save(&stored_name, data).await?;
        Event::set_image(&state.db, event_id, &stored_name).await?;

        if let Some(old) = &event.image_filename {
            if let Err(e) = state.images.remove(old).await {
                warn!(error = %e, filename = %old, "failed to remove replaced image");
            }
        }

        info!(%event_id, filename = %stored_name, "event image uploaded");
        return Ok(Json(UploadedImageResponse {
            image_filename: stored_name,
        }));
    }

    Err(AppError::Validation("An image file is required".into()))
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn payload() -> EventPayload {
        EventPayload {
            title: "Community Picnic".into(),
            description: "Bring a dish.".into(),
            location: "Riverside Park".into(),
            event_date: OffsetDateTime::now_utc(),
            registration_deadline: None,
            capacity: 20,
            category: None,
            status: None,
        }
    }

    #[test]
    fn whitespace_title_fails_validation() {
        let mut p = payload();
        p.title = "   ".into();
        assert!(matches!(
            validate_payload(&p),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn blank_description_and_location_fail_validation() {
        let mut p = payload();
        p.description = String::new();
        assert!(validate_payload(&p).is_err());

        let mut p = payload();
        p.location = " ".into();
        assert!(validate_payload(&p).is_err());
    }

    #[test]
    fn omitted_status_keeps_the_stored_status() {
        let p = payload();
        assert_eq!(
            fields_of(&p, EventStatus::Published).status,
            EventStatus::Published
        );
        assert_eq!(fields_of(&p, EventStatus::Draft).status, EventStatus::Draft);
    }

    #[test]
    fn explicit_status_wins_over_the_fallback() {
        let mut p = payload();
        p.status = Some(EventStatus::Cancelled);
        assert_eq!(
            fields_of(&p, EventStatus::Published).status,
            EventStatus::Cancelled
        );
    }
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::dto::{MessageResponse, PublicUser};
use crate::auth::extractors::RequireAdmin;
use crate::auth::repo::{User, UserRole};
use crate::auth::services::{is_unique_violation, validate_credentials};
use crate::error::AppError;
use crate::events::dto::EventPayload;
use crate::events::handlers::{fields_of, validate_payload};
use crate::events::repo::{Event, EventRegistration, EventStatus, RegistrationStatus};
use crate::state::AppState;

use super::dto::{
    offset, AdminEventListQuery, AdminUserUpdate, CategoryCount, DashboardResponse,
    RegistrationListQuery, RoleCounts, StatisticsResponse, StatusCounts, UserListQuery,
};

#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardResponse>, AppError> {
    let db = &state.db;
    Ok(Json(DashboardResponse {
        total_users: User::count(db).await?,
        total_events: Event::count(db).await?,
        total_registrations: EventRegistration::count(db).await?,
        users_by_role: RoleCounts {
            admin: User::count_by_role(db, UserRole::Admin).await?,
            organizer: User::count_by_role(db, UserRole::Organizer).await?,
            user: User::count_by_role(db, UserRole::User).await?,
        },
        events_by_status: StatusCounts {
            published: Event::count_by_status(db, EventStatus::Published).await?,
            draft: Event::count_by_status(db, EventStatus::Draft).await?,
            cancelled: Event::count_by_status(db, EventStatus::Cancelled).await?,
        },
        recent_events: Event::recent(db, 5).await?,
        upcoming_events: Event::upcoming_published(db, 5).await?,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let page_size = state.config.admin_page_size;
    let users = User::list(
        &state.db,
        query.role,
        query.search.as_deref().filter(|s| !s.is_empty()),
        page_size,
        offset(query.page, page_size),
    )
    .await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<PublicUser>, AppError> {
    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    // Admin accounts are only editable by themselves, and never demotable.
    if target.role.is_admin() && target.id != admin.id {
        return Err(AppError::Forbidden(
            "You cannot edit other admin accounts.".into(),
        ));
    }
    if target.role.is_admin() && payload.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin accounts cannot be demoted.".into()));
    }

    validate_credentials(&payload.username, &payload.email)?;

    let updated = match User::update_account(
        &state.db,
        user_id,
        payload.username.trim(),
        payload.email.trim(),
        payload.role,
        payload.is_active,
    )
    .await
    {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Rejected(
                "Username or email is already taken.".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user_id, admin = %admin.id, "user account updated");
    Ok(Json(PublicUser::from(updated)))
}

#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if target.id == admin.id {
        return Err(AppError::Forbidden("You cannot delete your own account.".into()));
    }
    if target.role.is_admin() {
        return Err(AppError::Forbidden("Admin accounts cannot be deleted.".into()));
    }

    let username = target.username.clone();
    User::delete(&state.db, user_id).await?;

    info!(user_id = %user_id, admin = %admin.id, "user deleted");
    Ok(Json(MessageResponse::ok(format!(
        "User {} deleted successfully.",
        username
    ))))
}

#[instrument(skip(state, admin))]
pub async fn promote_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if target.role.is_admin() {
        return Err(AppError::Forbidden("Admin roles cannot be changed.".into()));
    }

    let updated = User::set_role(&state.db, user_id, UserRole::Organizer).await?;
    info!(user_id = %user_id, admin = %admin.id, "user promoted to organizer");
    Ok(Json(PublicUser::from(updated)))
}

#[instrument(skip(state, admin))]
pub async fn demote_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if target.role.is_admin() {
        return Err(AppError::Forbidden("Cannot demote admin users.".into()));
    }

    let updated = User::set_role(&state.db, user_id, UserRole::User).await?;
    info!(user_id = %user_id, admin = %admin.id, "user demoted to user");
    Ok(Json(PublicUser::from(updated)))
}

#[instrument(skip(state, _admin))]
pub async fn list_events(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<AdminEventListQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let page_size = state.config.admin_page_size;
    let events = Event::list_admin(
        &state.db,
        query.status,
        query.category.as_deref().filter(|s| !s.is_empty()),
        page_size,
        offset(query.page, page_size),
    )
    .await?;
    Ok(Json(events))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<Event>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    // Same field validation as the organizer edit path.
    validate_payload(&payload)?;

    let updated = Event::update(&state.db, event_id, fields_of(&payload, event.status)).await?;

    info!(event_id = %event_id, admin = %admin.id, "event updated by admin");
    Ok(Json(updated))
}

#[instrument(skip(state, admin))]
pub async fn delete_event(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(event_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let event = Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;

    let title = event.title.clone();
    Event::delete(&state.db, event_id).await?;

    info!(event_id = %event_id, admin = %admin.id, "event deleted by admin");
    Ok(Json(MessageResponse::ok(format!(
        "Event \"{}\" deleted successfully.",
        title
    ))))
}

#[instrument(skip(state, _admin))]
pub async fn event_registrations(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<EventRegistration>>, AppError> {
    Event::find_by_id(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event"))?;
    Ok(Json(
        EventRegistration::list_for_event(&state.db, event_id).await?,
    ))
}

#[instrument(skip(state, _admin))]
pub async fn all_registrations(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Vec<EventRegistration>>, AppError> {
    let page_size = state.config.admin_page_size;
    Ok(Json(
        EventRegistration::list_all(
            &state.db,
            query.event_id,
            page_size,
            offset(query.page, page_size),
        )
        .await?,
    ))
}

#[instrument(skip(state, _admin))]
pub async fn statistics(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<StatisticsResponse>, AppError> {
    let db = &state.db;
    let events_by_category = Event::count_by_category(db)
        .await?
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

    Ok(Json(StatisticsResponse {
        total_users: User::count(db).await?,
        active_users: User::count_active(db).await?,
        users_by_role: RoleCounts {
            admin: User::count_by_role(db, UserRole::Admin).await?,
            organizer: User::count_by_role(db, UserRole::Organizer).await?,
            user: User::count_by_role(db, UserRole::User).await?,
        },
        total_events: Event::count(db).await?,
        upcoming_events: Event::count_upcoming(db).await?,
        past_events: Event::count_past(db).await?,
        total_registrations: EventRegistration::count(db).await?,
        cancelled_registrations: EventRegistration::count_by_status(
            db,
            RegistrationStatus::Cancelled,
        )
        .await?,
        events_by_category,
    }))
}

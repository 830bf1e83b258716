pub mod dto;
pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

/// Every handler in here takes the `RequireAdmin` guard as its first
/// extractor; there is no implicit before-request hook.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(handlers::dashboard))
        .route("/admin/statistics", get(handlers::statistics))
        .route("/admin/users", get(handlers::list_users))
        .route(
            "/admin/users/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .route("/admin/users/:id/promote", post(handlers::promote_user))
        .route("/admin/users/:id/demote", post(handlers::demote_user))
        .route("/admin/events", get(handlers::list_events))
        .route(
            "/admin/events/:id",
            put(handlers::update_event).delete(handlers::delete_event),
        )
        .route(
            "/admin/events/:id/registrations",
            get(handlers::event_registrations),
        )
        .route("/admin/registrations", get(handlers::all_registrations))
}

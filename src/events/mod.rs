pub mod dto;
pub mod handlers;
pub mod repo;
pub mod rules;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/events", get(handlers::list_events).post(handlers::create_event))
        .route("/events/categories", get(handlers::list_categories))
        .route("/events/mine", get(handlers::my_events))
        .route("/events/registered", get(handlers::registered_events))
        .route(
            "/events/:id",
            get(handlers::event_detail)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route("/events/:id/register", post(handlers::register_for_event))
        .route(
            "/events/:id/unregister",
            post(handlers::unregister_from_event),
        )
        .route(
            "/events/:id/image",
            post(handlers::upload_event_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::dto::MessageResponse;
use crate::auth::jwt::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

use super::repo::Notification;

const LIST_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub success: bool,
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[instrument(skip(state))]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<NotificationsResponse>, AppError> {
    let notifications = Notification::list_for_user(&state.db, user_id, LIST_LIMIT).await?;
    let unread_count = Notification::unread_count(&state.db, user_id).await?;
    Ok(Json(NotificationsResponse {
        success: true,
        notifications,
        unread_count,
    }))
}

#[instrument(skip(state))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !Notification::mark_read(&state.db, user_id, notification_id).await? {
        return Err(AppError::not_found("Notification"));
    }
    Ok(Json(MessageResponse::ok("Notification marked as read.")))
}

#[instrument(skip(state))]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    Notification::mark_all_read(&state.db, user_id).await?;
    Ok(Json(MessageResponse::ok("All notifications marked as read.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn response_shape_matches_the_api_contract() {
        let response = NotificationsResponse {
            success: true,
            notifications: vec![Notification {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                title: "New registration".into(),
                message: Some("ada registered for RustConf.".into()),
                notification_type: "info".into(),
                is_read: false,
                created_at: OffsetDateTime::now_utc(),
            }],
            unread_count: 1,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["unread_count"], 1);
        assert_eq!(json["notifications"][0]["type"], "info");
        assert!(json["notifications"][0].get("notification_type").is_none());
    }
}

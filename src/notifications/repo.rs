use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, notification_type, is_read, created_at";

impl Notification {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        message: &str,
        notification_type: &str,
    ) -> anyhow::Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, title, message, notification_type)
            VALUES ($1, $2, $3, $4)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(notification_type)
        .fetch_one(db)
        .await?;
        Ok(notification)
    }

    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn unread_count(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    /// Marks one of the user's notifications as read; returns whether a row
    /// actually belonged to them.
    pub async fn mark_read(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(db)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(db: &PgPool, user_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
    Attended,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: OffsetDateTime,
    pub registration_deadline: Option<OffsetDateTime>,
    pub capacity: i32,
    pub image_filename: Option<String>,
    pub status: EventStatus,
    pub category: Option<String>,
    pub creator_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventRegistration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
    pub registration_date: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub created_at: OffsetDateTime,
}

const EVENT_COLUMNS: &str = "id, title, description, location, event_date, \
                             registration_deadline, capacity, image_filename, status, \
                             category, creator_id, created_at, updated_at";

pub struct EventFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub event_date: OffsetDateTime,
    pub registration_deadline: Option<OffsetDateTime>,
    pub capacity: i32,
    pub status: EventStatus,
    pub category: Option<&'a str>,
}

/// Filters for the public event listing. All optional, combined with AND.
#[derive(Debug, Default)]
pub struct EventListFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub date_from: Option<OffsetDateTime>,
    pub date_to: Option<OffsetDateTime>,
}

impl Event {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(event)
    }

    /// Published future events for the public listing, soonest first.
    pub async fn list_published_upcoming(
        db: &PgPool,
        filter: &EventListFilter,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Event>> {
        let search = filter.search.as_deref().map(|s| format!("%{}%", s));
        let location = filter.location.as_deref().map(|s| format!("%{}%", s));
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE status = 'published'
              AND event_date > now()
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2)
              AND ($3::text IS NULL OR location ILIKE $3)
              AND ($4::timestamptz IS NULL OR event_date >= $4)
              AND ($5::timestamptz IS NULL OR event_date <= $5)
            ORDER BY event_date ASC
            LIMIT $6 OFFSET $7
            "#
        ))
        .bind(filter.category.as_deref())
        .bind(search)
        .bind(location)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(events)
    }

    pub async fn create(
        db: &PgPool,
        creator_id: Uuid,
        fields: EventFields<'_>,
    ) -> anyhow::Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, description, location, event_date,
                                registration_deadline, capacity, status, category, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.location)
        .bind(fields.event_date)
        .bind(fields.registration_deadline)
        .bind(fields.capacity)
        .bind(fields.status)
        .bind(fields.category)
        .bind(creator_id)
        .fetch_one(db)
        .await?;
        Ok(event)
    }

    pub async fn update(db: &PgPool, id: Uuid, fields: EventFields<'_>) -> anyhow::Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $2, description = $3, location = $4, event_date = $5,
                registration_deadline = $6, capacity = $7, status = $8, category = $9,
                updated_at = now()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.location)
        .bind(fields.event_date)
        .bind(fields.registration_deadline)
        .bind(fields.capacity)
        .bind(fields.status)
        .bind(fields.category)
        .fetch_one(db)
        .await?;
        Ok(event)
    }

    pub async fn set_image(db: &PgPool, id: Uuid, filename: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE events SET image_filename = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(filename)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Registrations are removed with the event by the schema cascade.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn list_by_creator(db: &PgPool, creator_id: Uuid) -> anyhow::Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE creator_id = $1 ORDER BY created_at DESC"
        ))
        .bind(creator_id)
        .fetch_all(db)
        .await?;
        Ok(events)
    }

    /// Unfiltered-by-visibility listing for moderation.
    pub async fn list_admin(
        db: &PgPool,
        status: Option<EventStatus>,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE ($1::event_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(status)
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(events)
    }

    pub async fn upcoming_published(db: &PgPool, limit: i64) -> anyhow::Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE status = 'published' AND event_date > now()
            ORDER BY event_date ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(events)
    }

    pub async fn recent(db: &PgPool, limit: i64) -> anyhow::Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(events)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(db: &PgPool, status: EventStatus) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE status = $1")
            .bind(status)
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn count_upcoming(db: &PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM events WHERE event_date > now()")
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    pub async fn count_past(db: &PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM events WHERE event_date <= now()")
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    pub async fn count_by_category(db: &PgPool) -> anyhow::Result<Vec<(Option<String>, i64)>> {
        let rows: Vec<(Option<String>, i64)> =
            sqlx::query_as("SELECT category, COUNT(*) FROM events GROUP BY category")
                .fetch_all(db)
                .await?;
        Ok(rows)
    }
}

impl EventRegistration {
    /// Count of rows that still hold a spot.
    pub async fn active_count_for_event(db: &PgPool, event_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = 'registered'",
        )
        .bind(event_id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    pub async fn find_active(
        db: &PgPool,
        user_id: Uuid,
        event_id: Uuid,
    ) -> anyhow::Result<Option<EventRegistration>> {
        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, user_id, event_id, status, notes, registration_date
            FROM event_registrations
            WHERE user_id = $1 AND event_id = $2 AND status = 'registered'
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(db)
        .await?;
        Ok(registration)
    }

    /// Inserts an active registration. A unique violation here means two
    /// requests raced past the rule engine; callers translate it into the
    /// duplicate rejection rather than a server error.
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        event_id: Uuid,
    ) -> anyhow::Result<EventRegistration> {
        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            INSERT INTO event_registrations (user_id, event_id, status)
            VALUES ($1, $2, 'registered')
            RETURNING id, user_id, event_id, status, notes, registration_date
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(db)
        .await?;
        Ok(registration)
    }

    /// Removes the pair's registration; returns how many rows went away so
    /// the caller can tell a no-op from a real unregistration.
    pub async fn delete_by_pair(db: &PgPool, user_id: Uuid, event_id: Uuid) -> anyhow::Result<u64> {
        let result =
            sqlx::query("DELETE FROM event_registrations WHERE user_id = $1 AND event_id = $2")
                .bind(user_id)
                .bind(event_id)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_event(
        db: &PgPool,
        event_id: Uuid,
    ) -> anyhow::Result<Vec<EventRegistration>> {
        let rows = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, user_id, event_id, status, notes, registration_date
            FROM event_registrations
            WHERE event_id = $1
            ORDER BY registration_date DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(
        db: &PgPool,
        event_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<EventRegistration>> {
        let rows = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, user_id, event_id, status, notes, registration_date
            FROM event_registrations
            WHERE ($1::uuid IS NULL OR event_id = $1)
            ORDER BY registration_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Events the user holds an active registration for, soonest first.
    pub async fn registered_events(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.title, e.description, e.location, e.event_date,
                   e.registration_deadline, e.capacity, e.image_filename, e.status,
                   e.category, e.creator_id, e.created_at, e.updated_at
            FROM events e
            JOIN event_registrations r ON r.event_id = e.id
            WHERE r.user_id = $1 AND r.status = 'registered'
            ORDER BY e.event_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(events)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_registrations")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(db: &PgPool, status: RegistrationStatus) -> anyhow::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_registrations WHERE status = $1")
                .bind(status)
                .fetch_one(db)
                .await?;
        Ok(count)
    }
}

impl Category {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, icon, color, created_at \
             FROM categories ORDER BY name",
        )
        .fetch_all(db)
        .await?;
        Ok(categories)
    }
}

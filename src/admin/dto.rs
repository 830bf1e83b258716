use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::UserRole;
use crate::events::repo::{Event, EventStatus};

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminUserUpdate {
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdminEventListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub status: Option<EventStatus>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub event_id: Option<Uuid>,
}

pub fn offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1) * page_size
}

#[derive(Debug, Serialize)]
pub struct RoleCounts {
    pub admin: i64,
    pub organizer: i64,
    pub user: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusCounts {
    pub published: i64,
    pub draft: i64,
    pub cancelled: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_users: i64,
    pub total_events: i64,
    pub total_registrations: i64,
    pub users_by_role: RoleCounts,
    pub events_by_status: StatusCounts,
    pub recent_events: Vec<Event>,
    pub upcoming_events: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub users_by_role: RoleCounts,
    pub total_events: i64,
    pub upcoming_events: i64,
    pub past_events: i64,
    pub total_registrations: i64,
    pub cancelled_registrations: i64,
    pub events_by_category: Vec<CategoryCount>,
}

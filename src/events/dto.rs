use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use super::repo::{Event, EventListFilter, EventStatus};

/// Query string for the public event listing.
#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub category: Option<String>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

fn default_page() -> i64 {
    1
}

/// Parses `YYYY-MM-DD`; unparseable input is ignored rather than rejected,
/// matching lenient filter behavior.
fn parse_filter_date(value: Option<&str>) -> Option<OffsetDateTime> {
    let format = format_description!("[year]-[month]-[day]");
    value
        .and_then(|v| Date::parse(v, &format).ok())
        .map(|d| d.midnight().assume_utc())
}

impl EventListQuery {
    pub fn filter(&self) -> EventListFilter {
        EventListFilter {
            category: self.category.clone().filter(|s| !s.is_empty()),
            search: self.search.clone().filter(|s| !s.is_empty()),
            location: self.location.clone().filter(|s| !s.is_empty()),
            date_from: parse_filter_date(self.date_from.as_deref()),
            date_to: parse_filter_date(self.date_to.as_deref()),
        }
    }

    pub fn offset(&self, page_size: i64) -> i64 {
        (self.page.max(1) - 1) * page_size
    }
}

/// Request body for creating or editing an event.
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub event_date: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub registration_deadline: Option<OffsetDateTime>,
    pub capacity: i32,
    pub category: Option<String>,
    pub status: Option<EventStatus>,
}

/// Event detail with the computed availability fields alongside the record.
#[derive(Debug, Serialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub registration_count: i64,
    pub available_spots: i64,
    pub is_full: bool,
    pub is_registration_open: bool,
    pub is_upcoming: bool,
    /// Present only for authenticated callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_registered: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UploadedImageResponse {
    pub image_filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_dates_parse_iso_days() {
        let parsed = parse_filter_date(Some("2026-09-01")).expect("should parse");
        assert_eq!(parsed.date().to_string(), "2026-09-01");
    }

    #[test]
    fn bad_filter_dates_are_ignored() {
        assert!(parse_filter_date(Some("septemberish")).is_none());
        assert!(parse_filter_date(Some("2026-13-45")).is_none());
        assert!(parse_filter_date(None).is_none());
    }

    #[test]
    fn empty_filter_strings_are_dropped() {
        let query = EventListQuery {
            page: 1,
            category: Some(String::new()),
            search: Some("rust".into()),
            location: None,
            date_from: None,
            date_to: None,
        };
        let filter = query.filter();
        assert!(filter.category.is_none());
        assert_eq!(filter.search.as_deref(), Some("rust"));
    }

    #[test]
    fn page_offsets_never_go_negative() {
        let mut query = EventListQuery {
            page: 0,
            category: None,
            search: None,
            location: None,
            date_from: None,
            date_to: None,
        };
        assert_eq!(query.offset(10), 0);
        query.page = 3;
        assert_eq!(query.offset(10), 20);
    }
}

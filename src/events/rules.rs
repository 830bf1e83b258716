//! Pure evaluation of event capacity and registration-window rules.
//!
//! Nothing in here reads the clock or touches the database: callers hand in
//! an event snapshot, the current active-registration count, and `now`, and
//! get back either an admission or the first rule that failed.

use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Event, EventStatus};
use crate::error::AppError;

/// The fields of an event the rules care about.
#[derive(Debug, Clone, Copy)]
pub struct EventSnapshot {
    pub status: EventStatus,
    pub capacity: i32,
    pub event_date: OffsetDateTime,
    pub registration_deadline: Option<OffsetDateTime>,
    pub creator_id: Uuid,
}

impl From<&Event> for EventSnapshot {
    fn from(event: &Event) -> Self {
        Self {
            status: event.status,
            capacity: event.capacity,
            event_date: event.event_date,
            registration_deadline: event.registration_deadline,
            creator_id: event.creator_id,
        }
    }
}

pub fn available_spots(capacity: i32, registered: i64) -> i64 {
    (i64::from(capacity) - registered).max(0)
}

pub fn is_full(capacity: i32, registered: i64) -> bool {
    available_spots(capacity, registered) == 0
}

impl EventSnapshot {
    pub fn is_registration_open(&self, now: OffsetDateTime) -> bool {
        self.status == EventStatus::Published
            && self.registration_deadline.map_or(true, |deadline| now < deadline)
    }

    pub fn is_upcoming(&self, now: OffsetDateTime) -> bool {
        self.event_date > now
    }
}

/// Why an applicant was turned away. Variant order is the evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDenied {
    RegistrationClosed,
    EventFull,
    AlreadyRegistered,
    OwnEvent,
}

impl AdmissionDenied {
    pub fn message(self) -> &'static str {
        match self {
            AdmissionDenied::RegistrationClosed => "Registration for this event is closed.",
            AdmissionDenied::EventFull => "This event is fully booked.",
            AdmissionDenied::AlreadyRegistered => "You are already registered for this event.",
            AdmissionDenied::OwnEvent => "You cannot register for your own event.",
        }
    }
}

impl From<AdmissionDenied> for AppError {
    fn from(denied: AdmissionDenied) -> Self {
        AppError::Rejected(denied.message().to_string())
    }
}

/// The admission check run before any registration write. Short-circuits on
/// the first failing rule: closed, then full, then duplicate, then self.
pub fn check_admission(
    event: &EventSnapshot,
    registered: i64,
    applicant: Uuid,
    already_registered: bool,
    now: OffsetDateTime,
) -> Result<(), AdmissionDenied> {
    if !event.is_registration_open(now) {
        return Err(AdmissionDenied::RegistrationClosed);
    }
    if is_full(event.capacity, registered) {
        return Err(AdmissionDenied::EventFull);
    }
    if already_registered {
        return Err(AdmissionDenied::AlreadyRegistered);
    }
    if event.creator_id == applicant {
        return Err(AdmissionDenied::OwnEvent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn published_event(capacity: i32) -> EventSnapshot {
        EventSnapshot {
            status: EventStatus::Published,
            capacity,
            event_date: now() + Duration::days(7),
            registration_deadline: Some(now() + Duration::days(1)),
            creator_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn available_spots_is_capacity_minus_registered() {
        assert_eq!(available_spots(100, 0), 100);
        assert_eq!(available_spots(100, 40), 60);
        assert_eq!(available_spots(5, 5), 0);
    }

    #[test]
    fn available_spots_clamps_at_zero_when_over_capacity() {
        assert_eq!(available_spots(5, 9), 0);
        assert!(is_full(5, 9));
    }

    #[test]
    fn full_iff_no_spots_remain() {
        assert!(!is_full(2, 1));
        assert!(is_full(2, 2));
    }

    #[test]
    fn registration_open_for_published_event_without_deadline() {
        let mut event = published_event(10);
        event.registration_deadline = None;
        assert!(event.is_registration_open(now()));
    }

    #[test]
    fn registration_closes_after_deadline() {
        let mut event = published_event(10);
        event.registration_deadline = Some(now() - Duration::hours(1));
        assert!(!event.is_registration_open(now()));
    }

    #[test]
    fn draft_and_cancelled_events_are_never_open() {
        let mut event = published_event(10);
        event.status = EventStatus::Draft;
        assert!(!event.is_registration_open(now()));
        event.status = EventStatus::Cancelled;
        assert!(!event.is_registration_open(now()));
    }

    #[test]
    fn upcoming_tracks_event_date() {
        let mut event = published_event(10);
        assert!(event.is_upcoming(now()));
        event.event_date = now() - Duration::hours(1);
        assert!(!event.is_upcoming(now()));
    }

    #[test]
    fn admission_granted_when_all_rules_pass() {
        let event = published_event(10);
        let applicant = Uuid::new_v4();
        assert!(check_admission(&event, 3, applicant, false, now()).is_ok());
    }

    #[test]
    fn draft_event_rejects_with_closed_regardless_of_capacity() {
        let mut event = published_event(10);
        event.status = EventStatus::Draft;
        let result = check_admission(&event, 0, Uuid::new_v4(), false, now());
        assert_eq!(result, Err(AdmissionDenied::RegistrationClosed));
    }

    #[test]
    fn closed_wins_over_full_duplicate_and_self() {
        let mut event = published_event(1);
        event.status = EventStatus::Draft;
        // Every later rule would also fail; the first one must win.
        let result = check_admission(&event, 1, event.creator_id, true, now());
        assert_eq!(result, Err(AdmissionDenied::RegistrationClosed));
    }

    #[test]
    fn full_wins_over_duplicate_and_self() {
        let event = published_event(1);
        let result = check_admission(&event, 1, event.creator_id, true, now());
        assert_eq!(result, Err(AdmissionDenied::EventFull));
    }

    #[test]
    fn duplicate_wins_over_self() {
        let event = published_event(10);
        let result = check_admission(&event, 0, event.creator_id, true, now());
        assert_eq!(result, Err(AdmissionDenied::AlreadyRegistered));
    }

    #[test]
    fn creator_is_rejected_even_with_open_window_and_free_spots() {
        let event = published_event(10);
        let result = check_admission(&event, 0, event.creator_id, false, now());
        assert_eq!(result, Err(AdmissionDenied::OwnEvent));
    }

    #[test]
    fn capacity_two_admits_two_then_rejects_the_third_with_full() {
        let event = published_event(2);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();

        assert!(check_admission(&event, 0, first, false, now()).is_ok());
        assert!(check_admission(&event, 1, second, false, now()).is_ok());
        assert_eq!(
            check_admission(&event, 2, third, false, now()),
            Err(AdmissionDenied::EventFull)
        );
    }

    #[test]
    fn second_attempt_by_same_user_is_a_duplicate() {
        let event = published_event(10);
        let user = Uuid::new_v4();
        assert!(check_admission(&event, 0, user, false, now()).is_ok());
        assert_eq!(
            check_admission(&event, 1, user, true, now()),
            Err(AdmissionDenied::AlreadyRegistered)
        );
    }

    #[test]
    fn denial_messages_are_stable() {
        assert_eq!(
            AdmissionDenied::RegistrationClosed.message(),
            "Registration for this event is closed."
        );
        assert_eq!(
            AdmissionDenied::EventFull.message(),
            "This event is fully booked."
        );
        assert_eq!(
            AdmissionDenied::AlreadyRegistered.message(),
            "You are already registered for this event."
        );
        assert_eq!(
            AdmissionDenied::OwnEvent.message(),
            "You cannot register for your own event."
        );
    }
}

//! Data models for Shelfwise

pub mod actor;
pub mod book;
pub mod reservation;

use chrono::{DateTime, NaiveDate, Utc};

// Re-export commonly used types
pub use actor::{Actor, ActorSummary, Capability, PermissionSet};
pub use book::{Book, BookSummary};
pub use reservation::{Reservation, ReservationDetails, ReservationStatus};

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

//! Calendar-date normalisation for dates entering the leave workflow.
//!
//! Clients send dates either as plain calendar dates, as RFC 3339
//! timestamps, or as the `{ seconds, nanoseconds }` timestamp wrapper used by
//! document stores. Everything is converted to a [`NaiveDate`] once, at the
//! boundary, and the rest of the crate only works with calendar dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp wrapper as exported by document stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimestamp {
    pub seconds: i64,
    #[serde(default)]
    pub nanoseconds: u32,
}

/// A date value as received, before normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Timestamp(StoreTimestamp),
    /// Anything else, kept so validation can name the field.
    Unparsed(serde_json::Value),
}

impl From<NaiveDate> for RawDate {
    fn from(date: NaiveDate) -> Self {
        RawDate::Date(date)
    }
}

/// Normalises any accepted date shape to a calendar date (UTC).
///
/// Returns `None` for a timestamp wrapper outside chrono's range and for
/// values that are not dates at all, such as `"2025-02-30"`.
pub fn to_calendar_date(raw: &RawDate) -> Option<NaiveDate> {
    match raw {
        RawDate::Date(date) => Some(*date),
        RawDate::DateTime(ts) => Some(ts.date_naive()),
        RawDate::Timestamp(ts) => {
            DateTime::from_timestamp(ts.seconds, ts.nanoseconds).map(|dt| dt.date_naive())
        }
        RawDate::Unparsed(_) => None,
    }
}

/// Inclusive number of days from `start` to `end`.
///
/// Same day counts as one. Negative or zero when `end` is before `start`.
pub fn inclusive_span(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

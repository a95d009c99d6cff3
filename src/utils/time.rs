//! Clock helpers used to name daily files and snapshots

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Current calendar day on the server's local clock
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYYMMDD` stamp used in daily file names
pub fn day_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `YYYYMMDD_HHMMSS_ffffff` stamp used in snapshot and upload names
pub fn instant_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S_%6f").to_string()
}

/// UTC time as ISO 8601 with microseconds, without offset
pub fn iso_utc_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

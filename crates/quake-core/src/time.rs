//! Epoch and calendar conversions used throughout the pipeline.

use chrono::{DateTime, TimeZone, Utc};

use crate::errors::{ErrorInfo, QuakeError};

/// Seconds in one astronomical year (365.25 days).
pub const SECONDS_PER_ASTRONOMICAL_YEAR: f64 = 31_557_600.0;

/// Milliseconds since the UTC epoch, right now.
pub fn utc_now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Formats an epoch-ms timestamp as an RFC 3339 UTC string.
pub fn epoch_ms_to_utc_string(epoch_ms: i64) -> String {
    match Utc.timestamp_millis_opt(epoch_ms).single() {
        Some(datetime) => datetime.to_rfc3339(),
        None => format!("epoch-ms:{epoch_ms}"),
    }
}

/// Parses an RFC 3339 timestamp into epoch milliseconds.
pub fn parse_utc_to_epoch_ms(text: &str) -> Result<i64, QuakeError> {
    DateTime::parse_from_rfc3339(text)
        .map(|datetime| datetime.with_timezone(&Utc).timestamp_millis())
        .map_err(|err| {
            QuakeError::Serde(
                ErrorInfo::new("quake_core.time_parse", err.to_string())
                    .with_context("input", text.to_string())
                    .with_hint("expected an RFC 3339 timestamp, e.g. 2019-07-06T03:19:53Z"),
            )
        })
}

/// Span between two epoch-ms timestamps, in astronomical years.
pub fn epoch_span_years(start_epoch_ms: i64, end_epoch_ms: i64) -> f64 {
    (end_epoch_ms - start_epoch_ms) as f64 / 1000.0 / SECONDS_PER_ASTRONOMICAL_YEAR
}

//! Second-precision UTC timestamps.
//!
//! Every persisted timestamp — and every timestamp embedded inside a payload
//! that gets hashed — is normalized to whole seconds in UTC and rendered as
//! RFC3339 with a literal `Z` suffix and no fractional part. `parse` is the
//! exact left inverse of `format` on anything `format` produced; result
//! payloads re-run parse→format on their own timestamp field before hashing
//! so two logically identical results never hash differently over sub-second
//! offsets.

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// Current instant.
pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Truncate to whole seconds and fix the timezone to UTC.
pub fn normalize_utc_timestamp<Tz: TimeZone>(value: DateTime<Tz>) -> DateTime<Utc> {
    value.with_timezone(&Utc).trunc_subsecs(0)
}

/// Render as RFC3339 with a `Z` suffix and no fractional seconds,
/// e.g. `2026-08-05T12:30:00Z`.
pub fn format_utc_timestamp<Tz: TimeZone>(value: DateTime<Tz>) -> String {
    normalize_utc_timestamp(value).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp (either `Z` or an explicit offset) back to a
/// normalized UTC instant.
pub fn parse_utc_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(normalize_utc_timestamp)
}

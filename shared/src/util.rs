/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC timestamp as an ISO-8601 / RFC 3339 string
///
/// Used for the display timestamps carried on orders, log entries and
/// inventory payloads.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Generate a fresh client-side record ID
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

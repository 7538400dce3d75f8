/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Minutes elapsed between two millisecond timestamps
pub fn minutes_between(start_millis: i64, end_millis: i64) -> f64 {
    (end_millis - start_millis) as f64 / 60_000.0
}

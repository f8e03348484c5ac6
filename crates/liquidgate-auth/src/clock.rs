//! Wall-clock access.

/// Current Unix time in whole seconds.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

use chrono::TimeZone as _;
use chrono_tz::Tz;

const LOCAL_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Renders epoch milliseconds as a wall-clock string in `tz`, e.g. `1/1/2026, 12:00:00 AM`.
pub fn format_local(epoch_ms: i64, tz: Tz) -> String {
    match tz.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => dt.format(LOCAL_FORMAT).to_string(),
        None => epoch_ms.to_string(),
    }
}

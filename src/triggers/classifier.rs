use crate::events::{LogEntry, PLACEHOLDER};
use log::debug;

/// Lowest status code counted as a server-side failure
pub const SERVER_ERROR_MIN: i64 = 500;

/// Decide whether a request failed on the server side
///
/// Either the final status or the upstream status being 5xx counts. Absent
/// values, the `-` placeholder and unparseable values all count as 0, one
/// field at a time, so a garbled upstream status cannot hide a 5xx final
/// status.
pub fn is_server_error(status: Option<&str>, upstream_status: Option<&str>) -> bool {
    status_code(status) >= SERVER_ERROR_MIN || status_code(upstream_status) >= SERVER_ERROR_MIN
}

/// Classify a decoded entry
pub fn is_error_entry(entry: &LogEntry) -> bool {
    is_server_error(entry.status.as_deref(), entry.upstream_status.as_deref())
}

/// Numeric status code, or 0 when absent or unparseable
fn status_code(value: Option<&str>) -> i64 {
    match value.map(str::trim) {
        None | Some("") | Some(PLACEHOLDER) => 0,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            debug!("Unparseable status code '{}', treating as 0", raw);
            0
        }),
    }
}

//! Decoder for `key=value` access-log lines
//!
//! The proxy writes one request per line as whitespace-separated
//! `key=value` tokens. A value may span several tokens: anything that does
//! not itself look like `key=` is appended to the value being captured.

use crate::error::DecodeError;
use crate::events::LogEntry;

/// URI prefix of load-balancer health checks, never counted
pub const HEALTHCHECK_PREFIX: &str = "/healthz";

/// Decode one raw log line
///
/// # Returns
///
/// * `Ok(Some(entry))` for a request line
/// * `Ok(None)` for a health-check request, which must be ignored
/// * `Err(DecodeError::NoFields)` when the line carries no `key=value` token
pub fn decode_line(line: &str) -> Result<Option<LogEntry>, DecodeError> {
    let mut entry = LogEntry::default();
    let mut current: Option<(&str, String)> = None;
    let mut field_count = 0usize;

    for token in line.split_whitespace() {
        match split_field(token) {
            Some((key, value)) => {
                if let Some((key, value)) = current.take() {
                    entry.set_field(key, value.trim().to_string());
                }
                current = Some((key, value.to_string()));
                field_count += 1;
            }
            None => {
                // Continuation of a multi-word value; leading junk is dropped
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(token);
                }
            }
        }
    }

    if let Some((key, value)) = current.take() {
        entry.set_field(key, value.trim().to_string());
    }

    if field_count == 0 {
        return Err(DecodeError::NoFields);
    }

    if is_healthcheck(&entry) {
        return Ok(None);
    }

    Ok(Some(entry))
}

/// Whether the entry is a health-check probe
pub fn is_healthcheck(entry: &LogEntry) -> bool {
    entry
        .uri
        .as_deref()
        .is_some_and(|uri| uri.starts_with(HEALTHCHECK_PREFIX))
}

/// Split a token of the shape `key=value`, where key is `[A-Za-z0-9_]+`
fn split_field(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value))
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    // Malformed input is either decoded or rejected, never a panic
    #[quickcheck]
    fn prop_decode_never_panics(line: String) -> bool {
        let _ = decode_line(&line);
        true
    }

    #[quickcheck]
    fn prop_single_word_values_round_trip(pool: String, status: u16) -> bool {
        let pool: String = pool.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if pool.is_empty() {
            return true;
        }

        let line = format!("pool={} status={}", pool, status);
        match decode_line(&line) {
            Ok(Some(entry)) => {
                entry.pool.as_deref() == Some(pool.as_str())
                    && entry.status == Some(status.to_string())
            }
            _ => false,
        }
    }
}

//! Opaque pagination cursors for the events listing.
//!
//! A cursor is the base64 of a JSON `(start_time, id)` pair pointing at the
//! last row the client saw. Everything a client could feed back is
//! validated before it reaches the query layer.

use crate::error::ApiError;
use axum::http::StatusCode;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub use crate::repositories::event::CursorData;

/// Longest accepted cursor string; anything bigger is garbage or abuse.
const MAX_CURSOR_CHARS: usize = 1000;
const MAX_DECODED_BYTES: usize = 500;
/// Events live within a season of history and a bounded forward window, so
/// a cursor pointing further than a year either way cannot match anything.
const HORIZON_DAYS: i64 = 365;

fn reject(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
}

/// Encode the pagination key of the last returned event.
pub fn encode_cursor(start_time: &DateTime<Utc>, id: &Uuid) -> String {
    let cursor_data = CursorData {
        start_time: *start_time,
        id: *id,
    };
    let json = serde_json::to_string(&cursor_data).unwrap_or_default();
    base64::engine::general_purpose::STANDARD.encode(json.as_bytes())
}

/// Decode and validate a client-supplied cursor.
pub fn decode_cursor(cursor: &str) -> Result<CursorData, ApiError> {
    if cursor.is_empty() {
        return Err(reject("cursor cannot be empty"));
    }
    if cursor.len() > MAX_CURSOR_CHARS {
        return Err(reject("cursor is too long"));
    }
    if !cursor
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
    {
        return Err(reject("cursor contains invalid characters"));
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(cursor)
        .map_err(|_| reject("cursor is not valid base64"))?;

    if decoded.is_empty() {
        return Err(reject("cursor is empty after decoding"));
    }
    if decoded.len() > MAX_DECODED_BYTES {
        return Err(reject("decoded cursor is too large"));
    }

    let json = String::from_utf8(decoded).map_err(|_| reject("cursor is not valid UTF-8"))?;
    let cursor_data: CursorData =
        serde_json::from_str(&json).map_err(|_| reject("cursor does not hold a pagination key"))?;

    let now = Utc::now();
    if cursor_data.start_time < now - Duration::days(HORIZON_DAYS) {
        return Err(reject("cursor timestamp is too old"));
    }
    if cursor_data.start_time > now + Duration::days(HORIZON_DAYS) {
        return Err(reject("cursor timestamp is too far in the future"));
    }
    if cursor_data.id.is_nil() {
        return Err(reject("cursor ID cannot be nil"));
    }

    Ok(cursor_data)
}

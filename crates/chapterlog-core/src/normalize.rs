//! Coercion of raw stored documents into [`TrackedItem`]s.
//!
//! Stored documents may have been written by older clients or edited by
//! hand, so nothing about their shape is trusted. Every function here is
//! total: bad input turns into defaults, never into an error.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::item::{MediaType, ReadingStatus, TrackedItem};
use crate::store::Document;

/// Coerce a JSON value into a non-negative count.
///
/// Numbers and numeric strings are accepted; fractions truncate toward zero.
/// Anything else (missing, null, negative, boolean, garbage) becomes 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_count(value: &Value) -> u32 {
    match as_number(value) {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc() as u32,
        _ => 0,
    }
}

/// Same as [`coerce_count`] but for epoch-millisecond timestamps.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_millis(value: &Value) -> i64 {
    if let Some(n) = value.as_i64() {
        return n.max(0);
    }
    match as_number(value) {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc() as i64,
        _ => 0,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Serde adapter applying [`coerce_count`] to a submitted field.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

fn text(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field<'a>(raw: &'a Value, key: &str) -> &'a Value {
    raw.get(key).unwrap_or(&Value::Null)
}

/// Build a [`TrackedItem`] from a stored document body.
#[must_use]
pub fn normalize_record(id: &str, raw: &Value) -> TrackedItem {
    let status = text(raw, "status")
        .and_then(|s| s.parse::<ReadingStatus>().ok())
        .unwrap_or_default();

    let media_type = text(raw, "mediaType").map_or_else(MediaType::default, MediaType::from);

    TrackedItem {
        id: id.to_string(),
        external_id: text(raw, "externalId").filter(|s| !s.is_empty()),
        title: text(raw, "title").unwrap_or_default(),
        media_type,
        status,
        current_chapter: coerce_count(field(raw, "currentChapter")),
        total_chapters: coerce_count(field(raw, "totalChapters")),
        rating: coerce_count(field(raw, "rating")),
        notes: text(raw, "notes").unwrap_or_default(),
        image_url: text(raw, "imageUrl").unwrap_or_default(),
        last_updated: coerce_millis(field(raw, "lastUpdated")),
    }
}

/// Normalize every document of a snapshot, keeping snapshot order.
#[must_use]
pub fn normalize_snapshot(documents: &[Document]) -> Vec<TrackedItem> {
    documents
        .iter()
        .map(|doc| normalize_record(&doc.id, &doc.data))
        .collect()
}

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Opaque document id assigned by the store
pub type ItemId = String;

/// Opaque per-session owner id; scopes every store operation
pub type OwnerId = String;

/// A raw stored document body
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

pub const MAX_RATING: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Reading,
    #[default]
    PlanToRead,
    Completed,
    Dropped,
}

impl ReadingStatus {
    pub const ALL: [Self; 4] = [Self::Reading, Self::PlanToRead, Self::Completed, Self::Dropped];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::PlanToRead => "plan_to_read",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::PlanToRead => "Plan to Read",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReadingStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| {
                status.as_str().eq_ignore_ascii_case(trimmed)
                    || status.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| crate::Error::InvalidStatus(s.to_string()))
    }
}

/// Publication format reported by the catalog.
///
/// Open-ended: anything the catalog sends that is not one of the known
/// formats is kept verbatim in `Other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    #[default]
    Manga,
    Manhwa,
    Manhua,
    Novel,
    Other(String),
}

impl MediaType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manga => "Manga",
            Self::Manhwa => "Manhwa",
            Self::Manhua => "Manhua",
            Self::Novel => "Novel",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "manga" => Self::Manga,
            "manhwa" => Self::Manhwa,
            "manhua" => Self::Manhua,
            "novel" => Self::Novel,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for MediaType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<MediaType> for String {
    fn from(m: MediaType) -> Self {
        match m {
            MediaType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One title on a user's reading list.
///
/// `id` lives outside the stored document; it is empty until the store has
/// assigned one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub title: String,
    pub media_type: MediaType,
    pub status: ReadingStatus,
    pub current_chapter: u32,
    /// 0 means the total is unknown
    pub total_chapters: u32,
    /// 0 means unrated
    pub rating: u32,
    pub notes: String,
    pub image_url: String,
    /// Milliseconds since the epoch
    pub last_updated: i64,
}

impl TrackedItem {
    /// The document body to hand to the store.
    pub fn to_record(&self) -> crate::Result<RawRecord> {
        let serde_json::Value::Object(mut record) = serde_json::to_value(self)? else {
            return Ok(RawRecord::new());
        };
        record.remove("id");
        Ok(record)
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.total_chapters > 0 && self.current_chapter >= self.total_chapters
    }
}

#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Mutation timestamp that never moves backwards for one item.
#[must_use]
pub const fn stamp(previous: i64, now: i64) -> i64 {
    if now > previous {
        now
    } else {
        previous
    }
}

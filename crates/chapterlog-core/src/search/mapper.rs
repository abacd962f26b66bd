use serde::Serialize;
use serde_json::Value;

use crate::item::{MediaType, ReadingStatus, TrackedItem};
use crate::normalize::coerce_count;
use crate::{Error, Result};

pub const MIN_QUERY_LEN: usize = 3;

/// Trim a search query and reject it locally if it is too short to send.
pub fn validate_query(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_QUERY_LEN {
        return Err(Error::QueryTooShort { min: MIN_QUERY_LEN });
    }
    Ok(trimmed)
}

/// One catalog search result that could be added to the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidate {
    pub external_id: Option<String>,
    pub title: String,
    pub media_type: MediaType,
    pub chapters: Option<u32>,
    pub image_url: Option<String>,
    /// Some item on the list already carries this external id
    pub already_tracked: bool,
    /// Added from this result list; set before the store confirms the write
    pub added: bool,
}

impl SearchCandidate {
    /// Whether any of `items` was created from this catalog entry.
    ///
    /// Candidates without an external id never match.
    #[must_use]
    pub fn is_tracked_in(&self, items: &[TrackedItem]) -> bool {
        self.external_id.as_ref().is_some_and(|external| {
            items
                .iter()
                .any(|item| item.external_id.as_ref() == Some(external))
        })
    }

    #[must_use]
    pub const fn can_track(&self) -> bool {
        !self.already_tracked && !self.added
    }

    /// The list entry this candidate starts out as.
    #[must_use]
    pub fn new_item(&self, now: i64) -> TrackedItem {
        TrackedItem {
            id: String::new(),
            external_id: self.external_id.clone(),
            title: self.title.clone(),
            media_type: self.media_type.clone(),
            status: ReadingStatus::PlanToRead,
            current_chapter: 0,
            total_chapters: self.chapters.unwrap_or(0),
            rating: 0,
            notes: String::new(),
            image_url: self.image_url.clone().unwrap_or_default(),
            last_updated: now,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map one raw catalog record (Jikan v4 manga shape) to a candidate.
///
/// Returns `None` for records without a usable title.
#[must_use]
pub fn map_candidate(raw: &Value, tracked: &[TrackedItem]) -> Option<SearchCandidate> {
    let title =
        non_empty_str(raw.get("title")).or_else(|| non_empty_str(raw.get("title_english")))?;

    let external_id = match raw.get("mal_id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    let chapters = raw
        .get("chapters")
        .filter(|v| !v.is_null())
        .map(coerce_count);

    let image_url = non_empty_str(raw.pointer("/images/jpg/image_url"))
        .or_else(|| non_empty_str(raw.pointer("/images/webp/image_url")));

    let media_type =
        non_empty_str(raw.get("type")).map_or_else(MediaType::default, MediaType::from);

    let mut candidate = SearchCandidate {
        external_id,
        title,
        media_type,
        chapters,
        image_url,
        already_tracked: false,
        added: false,
    };
    candidate.already_tracked = candidate.is_tracked_in(tracked);
    Some(candidate)
}

/// The result list of the most recent search, with its add-once flags.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    candidates: Vec<SearchCandidate>,
}

impl SearchSession {
    #[must_use]
    pub fn new(records: &[Value], tracked: &[TrackedItem]) -> Self {
        let candidates: Vec<SearchCandidate> = records
            .iter()
            .filter_map(|raw| map_candidate(raw, tracked))
            .collect();

        let skipped = records.len() - candidates.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Dropped catalog records without a title");
        }

        Self { candidates }
    }

    #[must_use]
    pub fn candidates(&self) -> &[SearchCandidate] {
        &self.candidates
    }

    /// Re-derive `already_tracked` against the current list.
    pub fn refresh(&mut self, tracked: &[TrackedItem]) {
        for candidate in &mut self.candidates {
            candidate.already_tracked = candidate.is_tracked_in(tracked);
        }
    }

    /// Mark a candidate as added and hand it back, exactly once.
    ///
    /// Returns `Ok(None)` when the candidate was already added from this
    /// list or is already on the list.
    pub fn claim(&mut self, index: usize) -> Result<Option<SearchCandidate>> {
        let candidate = self
            .candidates
            .get_mut(index)
            .ok_or(Error::CandidateNotFound(index))?;

        if !candidate.can_track() {
            return Ok(None);
        }

        candidate.added = true;
        Ok(Some(candidate.clone()))
    }
}

use serde::Deserialize;

use crate::item::{stamp, MediaType, ReadingStatus, TrackedItem, MAX_RATING};
use crate::normalize::lenient_count;

/// Values submitted from the edit form.
///
/// Optional text fields left out of the submission keep the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditForm {
    pub status: ReadingStatus,
    #[serde(default, deserialize_with = "lenient_count")]
    pub current_chapter: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_chapters: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub rating: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Step the chapter counter by `delta` (the quick +1 / -1 controls).
///
/// The chapter floors at 0. Status follows the first matching rule:
/// reaching the known total completes the title; leaving chapter 0 starts a
/// planned title; dropping back below the total reopens a completed title;
/// returning to 0 un-starts a title being read. Below the total, Dropped
/// titles never change status here.
#[must_use]
pub fn advance(item: &TrackedItem, delta: i64, now: i64) -> TrackedItem {
    let stepped = i64::from(item.current_chapter).saturating_add(delta).max(0);
    let mut next = TrackedItem {
        current_chapter: u32::try_from(stepped).unwrap_or(u32::MAX),
        last_updated: stamp(item.last_updated, now),
        ..item.clone()
    };

    let chapter = next.current_chapter;
    next.status = if next.is_finished() {
        ReadingStatus::Completed
    } else if chapter > 0 && item.status == ReadingStatus::PlanToRead {
        ReadingStatus::Reading
    } else if chapter > 0
        && chapter < next.total_chapters
        && item.status == ReadingStatus::Completed
    {
        ReadingStatus::Reading
    } else if chapter == 0 && item.status == ReadingStatus::Reading {
        ReadingStatus::PlanToRead
    } else {
        item.status
    };

    next
}

/// Merge an edit form submission over the stored item.
///
/// Unlike [`advance`], the submitted status is trusted except for two
/// overrides, checked in order: a planned title with progress becomes
/// Reading, otherwise progress at or past the known total becomes Completed.
#[must_use]
pub fn apply_edit(original: &TrackedItem, form: &EditForm, now: i64) -> TrackedItem {
    let image_url = match form.image_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => original.image_url.clone(),
    };

    let title = match form.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => original.title.clone(),
    };

    let mut next = TrackedItem {
        id: original.id.clone(),
        external_id: original.external_id.clone(),
        title,
        media_type: form
            .media_type
            .clone()
            .unwrap_or_else(|| original.media_type.clone()),
        status: form.status,
        current_chapter: form.current_chapter,
        total_chapters: form.total_chapters,
        rating: form.rating.min(MAX_RATING),
        notes: form.notes.clone().unwrap_or_else(|| original.notes.clone()),
        image_url,
        last_updated: stamp(original.last_updated, now),
    };

    if form.status == ReadingStatus::PlanToRead && next.current_chapter > 0 {
        next.status = ReadingStatus::Reading;
    } else if next.is_finished() {
        next.status = ReadingStatus::Completed;
    }

    next
}

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::item::{ReadingStatus, TrackedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    Rating,
    #[default]
    #[serde(alias = "last_updated")]
    LastUpdated,
}

impl std::str::FromStr for SortField {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "rating" => Ok(Self::Rating),
            "lastUpdated" | "last_updated" => Ok(Self::LastUpdated),
            _ => Err(crate::Error::InvalidSortField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReadingStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(&self, status: ReadingStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed.parse().map(Self::Only)
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = crate::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(f: StatusFilter) -> Self {
        match f {
            StatusFilter::All => "all".to_string(),
            StatusFilter::Only(status) => status.as_str().to_string(),
        }
    }
}

/// Everything the list view depends on besides the items themselves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOptions {
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub q: String,
}

fn compare(a: &TrackedItem, b: &TrackedItem, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Rating => a.rating.cmp(&b.rating),
        SortField::LastUpdated => a.last_updated.cmp(&b.last_updated),
    }
}

/// Sorted, filtered view of `items`.
///
/// The sort is stable in both directions: items that compare equal keep
/// their relative order from `items`.
#[must_use]
pub fn project<'a>(items: &'a [TrackedItem], options: &ViewOptions) -> Vec<&'a TrackedItem> {
    let mut view: Vec<&TrackedItem> = items.iter().collect();

    view.sort_by(|a, b| {
        let ord = compare(a, b, options.sort);
        match options.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    let needle = options.q.to_lowercase();
    view.retain(|item| {
        options.status.matches(item.status)
            && (needle.is_empty() || item.title.to_lowercase().contains(&needle))
    });

    view
}

/// Per-status totals, independent of the active filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub all: usize,
    pub reading: usize,
    pub plan_to_read: usize,
    pub completed: usize,
    pub dropped: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn tally(items: &[TrackedItem]) -> Self {
        items.iter().fold(Self::default(), |mut counts, item| {
            counts.all += 1;
            match item.status {
                ReadingStatus::Reading => counts.reading += 1,
                ReadingStatus::PlanToRead => counts.plan_to_read += 1,
                ReadingStatus::Completed => counts.completed += 1,
                ReadingStatus::Dropped => counts.dropped += 1,
            }
            counts
        })
    }
}

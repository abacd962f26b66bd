use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Search query must be at least {min} characters")]
    QueryTooShort { min: usize },

    #[error("Search result {0} does not exist")]
    CandidateNotFound(usize),

    #[error("Invalid reading status: {0}")]
    InvalidStatus(String),

    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("Catalog request failed: {0}")]
    Catalog(#[from] reqwest::Error),

    #[error("Catalog returned HTTP {0}")]
    CatalogStatus(u16),

    #[error("Invalid catalog URL: {0}")]
    CatalogUrl(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse failure classes, used by callers to decide how a failure surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input; shown inline, never retried.
    Validation,
    /// The search catalog could not be reached or answered with an error.
    Network,
    /// A store read or write failed; the operation is treated as not applied.
    Persistence,
    NotFound,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::QueryTooShort { .. }
            | Self::InvalidStatus(_)
            | Self::InvalidSortField(_) => ErrorKind::Validation,
            Self::Catalog(_) | Self::CatalogStatus(_) | Self::CatalogUrl(_) => ErrorKind::Network,
            Self::Database(_) | Self::Serialization(_) => ErrorKind::Persistence,
            Self::ItemNotFound(_) | Self::CandidateNotFound(_) => ErrorKind::NotFound,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

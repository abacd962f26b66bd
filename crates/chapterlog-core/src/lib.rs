pub mod error;
pub mod item;
pub mod normalize;
pub mod progress;
pub mod projection;
pub mod search;
pub mod store;
pub mod tracker;

pub use error::{Error, ErrorKind, Result};
pub use item::{ItemId, MediaType, OwnerId, RawRecord, ReadingStatus, TrackedItem, MAX_RATING};
pub use normalize::{normalize_record, normalize_snapshot};
pub use progress::{advance, apply_edit, EditForm};
pub use projection::{project, SortDirection, SortField, StatusCounts, StatusFilter, ViewOptions};
pub use search::{
    Catalog, CatalogClient, CatalogConfig, SearchCandidate, SearchSession, MIN_QUERY_LEN,
};
pub use store::{Document, DocumentStore, Snapshot, Storage, Subscription};
pub use tracker::Tracker;

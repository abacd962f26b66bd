mod client;
mod config;
mod mapper;

pub use client::{Catalog, CatalogClient};
pub use config::CatalogConfig;
pub use mapper::{map_candidate, validate_query, SearchCandidate, SearchSession, MIN_QUERY_LEN};

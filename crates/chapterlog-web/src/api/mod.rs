mod config;
mod items;
mod search;
mod session;

use axum::{Router, http::StatusCode};
use chapterlog_core::{Error, ErrorKind};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/config", config::router())
        .nest("/items", items::router())
        .nest("/search", search::router())
        .nest("/session", session::router())
}

pub(crate) const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Network => StatusCode::BAD_GATEWAY,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn api_error(e: &Error) -> (StatusCode, String) {
    (status_for(e.kind()), e.to_string())
}

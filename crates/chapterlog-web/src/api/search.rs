use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chapterlog_core::{SearchCandidate, TrackedItem};
use serde::{Deserialize, Serialize};

use super::{api_error, status_for};
use crate::session::{SessionToken, session_cookie};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search))
        .route("/results", get(current_results))
        .route("/{index}/track", post(track))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchResponse {
    pub candidates: Vec<SearchCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Run a catalog search; failures still answer with an (empty) result list.
async fn search(
    session: SessionToken,
    jar: CookieJar,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let jar = jar.add(session_cookie(session.id));

    match session.tracker.search(&query.q).await {
        Ok(candidates) => (
            StatusCode::OK,
            jar,
            Json(SearchResponse {
                candidates,
                message: None,
            }),
        ),
        Err(e) => (
            status_for(e.kind()),
            jar,
            Json(SearchResponse {
                candidates: Vec::new(),
                message: Some(e.to_string()),
            }),
        ),
    }
}

async fn current_results(session: SessionToken, jar: CookieJar) -> impl IntoResponse {
    let candidates = session.tracker.candidates().await;
    (
        jar.add(session_cookie(session.id)),
        Json(SearchResponse {
            candidates,
            message: None,
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub tracked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<TrackedItem>,
}

async fn track(
    session: SessionToken,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let item = session.tracker.track(index).await.map_err(|e| api_error(&e))?;

    let status = if item.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let response = TrackResponse {
        tracked: item.is_some(),
        item,
    };

    Ok((status, jar.add(session_cookie(session.id)), Json(response)))
}

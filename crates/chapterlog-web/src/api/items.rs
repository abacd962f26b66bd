use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
    },
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chapterlog_core::{
    normalize_snapshot, project, EditForm, StatusCounts, TrackedItem, ViewOptions,
};
use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt as _, wrappers::WatchStream};

use super::api_error;
use crate::session::{SessionToken, session_cookie};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items))
        .route("/events", get(item_events))
        .route("/{id}", get(get_item).put(edit_item).delete(delete_item))
        .route("/{id}/advance", post(advance_item))
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<TrackedItem>,
    pub counts: StatusCounts,
}

impl ItemsResponse {
    fn build(items: &[TrackedItem], options: &ViewOptions) -> Self {
        Self {
            items: project(items, options).into_iter().cloned().collect(),
            counts: StatusCounts::tally(items),
        }
    }
}

async fn list_items(
    session: SessionToken,
    jar: CookieJar,
    Query(options): Query<ViewOptions>,
) -> impl IntoResponse {
    let items = session.tracker.items().await;
    let response = ItemsResponse::build(&items, &options);
    (jar.add(session_cookie(session.id)), Json(response))
}

/// Server-sent `snapshot` events carrying the projected list.
///
/// The current list is sent on connect, then again after every change.
async fn item_events(
    session: SessionToken,
    jar: CookieJar,
    Query(options): Query<ViewOptions>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let subscription = session.tracker.watch().await.map_err(|e| api_error(&e))?;

    let stream = WatchStream::new(subscription.into_receiver()).filter_map(move |snapshot| {
        let items = normalize_snapshot(&snapshot);
        let response = ItemsResponse::build(&items, &options);
        match serde_json::to_string(&response) {
            Ok(json) => Some(Ok::<_, Infallible>(Event::default().event("snapshot").data(json))),
            Err(e) => {
                tracing::warn!("Failed to encode snapshot event: {}", e);
                None
            }
        }
    });

    Ok((jar.add(session_cookie(session.id)), sse(stream)))
}

fn sse<S>(stream: S) -> Sse<KeepAliveStream<S>>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

async fn get_item(
    session: SessionToken,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let item = session.tracker.get(&id).await.map_err(|e| api_error(&e))?;
    Ok((jar.add(session_cookie(session.id)), Json(item)))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub delta: i64,
}

async fn advance_item(
    session: SessionToken,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(req): Json<AdvanceRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let item = session
        .tracker
        .advance(&id, req.delta)
        .await
        .map_err(|e| api_error(&e))?;
    Ok((jar.add(session_cookie(session.id)), Json(item)))
}

async fn edit_item(
    session: SessionToken,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(form): Json<EditForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let item = session
        .tracker
        .edit(&id, &form)
        .await
        .map_err(|e| api_error(&e))?;
    Ok((jar.add(session_cookie(session.id)), Json(item)))
}

async fn delete_item(
    session: SessionToken,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    session.tracker.remove(&id).await.map_err(|e| api_error(&e))?;
    Ok((StatusCode::NO_CONTENT, jar.add(session_cookie(session.id))))
}

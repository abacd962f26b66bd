use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::session::{SessionToken, removal_cookie, session_cookie};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/logout", post(logout))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub owner_id: String,
    pub item_count: usize,
    pub created_at: Option<String>,
}

async fn get_session(
    State(state): State<AppState>,
    session: SessionToken,
    jar: CookieJar,
) -> impl IntoResponse {
    let item_count = session.tracker.items().await.len();
    let created_at = state
        .sessions
        .read()
        .await
        .get_session(session.id)
        .map(|s| s.created_at.to_rfc3339());

    let response = SessionResponse {
        session_id: session.id,
        owner_id: session.tracker.owner().to_string(),
        item_count,
        created_at,
    };

    (jar.add(session_cookie(session.id)), Json(response))
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let ended = jar
        .get(crate::session::SESSION_COOKIE_NAME)
        .and_then(|cookie| cookie.value().parse::<Uuid>().ok());

    if let Some(session_id) = ended {
        if state.sessions.write().await.end_session(session_id) {
            tracing::debug!(%session_id, "Ended session");
        }
    }

    (StatusCode::NO_CONTENT, jar.remove(removal_cookie()))
}

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chapterlog_core::Tracker;
use uuid::Uuid;

use crate::state::{AppState, SessionId};

pub const SESSION_COOKIE_NAME: &str = "chapterlog_session";

/// Extractor that resolves the session cookie to a running tracker
///
/// A missing or unreadable cookie starts a fresh session; handlers send the
/// cookie back with [`session_cookie`].
pub struct SessionToken {
    pub id: SessionId,
    pub tracker: Arc<Tracker>,
}

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state).await.map_err(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read cookies".to_string())
        })?;

        let id = jar
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| cookie.value().parse::<Uuid>().ok())
            .unwrap_or_else(Uuid::new_v4);

        let tracker = state.tracker(id).await.map_err(|e| {
            tracing::error!(session_id = %id, error = %e, "Failed to start session");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        })?;

        Ok(Self { id, tracker })
    }
}

/// Cookie to set on responses so the browser keeps its session
pub fn session_cookie(session_id: SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Cookie that clears the session on logout
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build()
}

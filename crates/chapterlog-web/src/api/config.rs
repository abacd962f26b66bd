use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use chapterlog_core::MIN_QUERY_LEN;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_config))
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub min_query_length: usize,
    pub search_limit: u32,
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(ConfigResponse {
        min_query_length: MIN_QUERY_LEN,
        search_limit: state.config.catalog.search_limit,
    })
}

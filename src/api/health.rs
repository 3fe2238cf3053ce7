use crate::SharedState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::SecondsFormat;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
}

/// Liveness check, never authenticated
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let body = Health {
        status: "healthy",
        timestamp: state
            .clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Micros, false),
    };

    (StatusCode::OK, Json(body))
}

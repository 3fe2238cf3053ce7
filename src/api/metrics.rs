use crate::{auth::Principal, SharedState};
use axum::{debug_handler, extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

pub const READABLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The current time in three representations, all derived from one clock read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeMetrics {
    pub timestamp_iso: String,
    pub timestamp_unix: i64,
    pub timestamp_readable: String,
}

impl TimeMetrics {
    pub fn at(instant: DateTime<Local>) -> Self {
        Self {
            timestamp_iso: instant.to_rfc3339_opts(SecondsFormat::Micros, false),
            timestamp_unix: instant.timestamp(),
            timestamp_readable: instant.format(READABLE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedMetrics {
    #[serde(flatten)]
    pub metrics: TimeMetrics,
    pub authenticated_user: String,
}

pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    (StatusCode::OK, Json(TimeMetrics::at(state.clock.now())))
}

#[debug_handler]
pub async fn authenticated_metrics(
    State(state): State<SharedState>,
    principal: Principal,
) -> impl IntoResponse {
    let body = AuthenticatedMetrics {
        metrics: TimeMetrics::at(state.clock.now()),
        authenticated_user: principal.username,
    };

    (StatusCode::OK, Json(body))
}

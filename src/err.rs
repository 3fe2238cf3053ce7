use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors raised while loading configuration and preparing the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid token entry: {0}, expected TOKEN=USER")]
    TokenEntry(String),

    #[error("{file} not found in directory: {dir}")]
    MissingCertificate { file: &'static str, dir: String },
}

/// Errors returned to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bearer credential missing, malformed or unknown
    #[error("Invalid token")]
    AuthenticationFailure,

    #[error("Not Found")]
    NotFound,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });

        match self {
            ApiError::AuthenticationFailure => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            ApiError::NotFound => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failure_is_unauthorized() {
        let response = ApiError::AuthenticationFailure.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn not_found_has_no_challenge() {
        let response = ApiError::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn token_entry_message_names_the_format() {
        let err = Error::TokenEntry("empty user".to_string());
        assert_eq!(
            err.to_string(),
            "invalid token entry: empty user, expected TOKEN=USER"
        );
    }
}

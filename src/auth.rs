pub mod gate;
pub mod tokens;

use crate::err::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// The user behind a validated bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

// Only present on requests that went through `gate::require_bearer`
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(ApiError::AuthenticationFailure)
    }
}

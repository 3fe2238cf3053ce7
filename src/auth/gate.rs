use crate::{auth::tokens::TokenTable, auth::Principal, err::ApiError, SharedState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::fmt;
use tracing::debug;

#[derive(Debug, PartialEq, Eq)]
enum Rejection {
    MissingHeader,
    Malformed,
    UnknownToken,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingHeader => write!(f, "no authorization header"),
            Rejection::Malformed => write!(f, "malformed bearer credential"),
            Rejection::UnknownToken => write!(f, "unknown token"),
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, Rejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(Rejection::MissingHeader)?
        .to_str()
        .map_err(|_| Rejection::Malformed)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        (None, _, _) => Err(Rejection::MissingHeader),
        _ => Err(Rejection::Malformed),
    }
}

fn authenticate(tokens: &TokenTable, headers: &HeaderMap) -> Result<Principal, Rejection> {
    let token = bearer_token(headers)?;
    tokens
        .lookup(token)
        .map(Principal::new)
        .ok_or(Rejection::UnknownToken)
}

/// Middleware for routes that need a valid bearer token.
///
/// On success the [`Principal`] is stored in the request extensions, where the
/// `Principal` extractor picks it up. Every failure is answered with
/// [`ApiError::AuthenticationFailure`].
pub async fn require_bearer(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = match authenticate(&state.tokens, request.headers()) {
        Ok(principal) => principal,
        Err(reason) => {
            debug!(path = %request.uri().path(), %reason, "Rejecting request");
            return Err(ApiError::AuthenticationFailure);
        }
    };

    debug!(user = %principal.username, "Request authenticated");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::TokenEntry;
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(authorization).unwrap(),
        );
        headers
    }

    fn table() -> TokenTable {
        TokenTable::from_entries([TokenEntry::new("grafana-token", "grafana")]).unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("  BEARER   abc  ")), Ok("abc"));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(Rejection::MissingHeader));
        assert_eq!(bearer_token(&headers("")), Err(Rejection::MissingHeader));
        assert_eq!(bearer_token(&headers("Bearer")), Err(Rejection::Malformed));
        assert_eq!(bearer_token(&headers("Basic abc")), Err(Rejection::Malformed));
        assert_eq!(bearer_token(&headers("Bearer a b")), Err(Rejection::Malformed));
    }

    #[test]
    fn rejects_non_ascii_header() {
        let mut map = HeaderMap::new();
        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff").unwrap(),
        );
        assert_eq!(bearer_token(&map), Err(Rejection::Malformed));
    }

    #[test]
    fn authenticates_known_token() {
        let principal = authenticate(&table(), &headers("Bearer grafana-token")).unwrap();
        assert_eq!(principal, Principal::new("grafana"));
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(
            authenticate(&table(), &headers("Bearer wrong-token")),
            Err(Rejection::UnknownToken)
        );
    }
}

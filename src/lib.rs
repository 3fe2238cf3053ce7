pub mod api;
pub mod app;
pub mod auth;
pub mod clock;
pub mod err;
pub mod init;

use auth::tokens::TokenTable;
use clock::Clock;
use std::sync::Arc;

/// Read-only state handed to every request handler
#[derive(Clone)]
pub struct SharedState {
    pub tokens: Arc<TokenTable>,
    pub clock: Arc<dyn Clock>,
}

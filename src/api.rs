pub mod health;
pub mod metrics;

use crate::err::ApiError;

pub async fn unknown_route() -> ApiError {
    ApiError::NotFound
}

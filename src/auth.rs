//! Upstream identity, consumed as a black box.
//!
//! Authentication itself lives in front of this service; requests arrive
//! with an `X-User-Id` header when the visitor is signed in. The
//! extractor surfaces that as an optional user id — nothing here mints,
//! verifies, or refreshes credentials.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Header set by the upstream auth layer for signed-in visitors.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user, when there is one.
///
/// A missing or malformed header simply yields `None`; guests are a
/// normal case, not an error.
#[derive(Debug, Clone, Copy)]
pub struct OptionalUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());

        Ok(OptionalUser(user_id))
    }
}

pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::{error::AppError, models::User, services, state::AppState};

/// The caller behind a valid bearer token, resolved against the user store.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();
        let token = header
            .as_ref()
            .map(|TypedHeader(Authorization(bearer))| bearer.token());

        let user = services::auth::current_user(state.store.as_ref(), &state.jwt, token).await?;
        Ok(AuthenticatedUser(user))
    }
}

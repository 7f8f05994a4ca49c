use axum::{extract::State, Json};

use super::ApiJson;
use crate::{
    auth::AuthenticatedUser,
    error::AppResult,
    services::auth::{self, LoginRequest, RegisterRequest, TokenResponse, UserProfile},
    state::AppState,
};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<Json<UserProfile>> {
    let profile = auth::register(state.store.as_ref(), payload).await?;
    Ok(Json(profile))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = auth::login(state.store.as_ref(), &state.jwt, payload).await?;
    Ok(Json(token))
}

pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserProfile> {
    Json(user.into())
}

use axum::{
    extract::State,
    Json,
};
use serde_json::Value;

use super::{ApiJson, ApiPath};
use crate::{
    error::AppResult,
    models::Engineer,
    services::{
        directory::{self, CreateEngineer},
        Confirmation,
    },
    state::AppState,
};

pub async fn list_engineers(State(state): State<AppState>) -> AppResult<Json<Vec<Engineer>>> {
    Ok(Json(directory::list_engineers(state.store.as_ref()).await?))
}

pub async fn create_engineer(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEngineer>,
) -> AppResult<Json<Engineer>> {
    Ok(Json(
        directory::create_engineer(state.store.as_ref(), payload).await?,
    ))
}

pub async fn get_engineer(
    State(state): State<AppState>,
    ApiPath(engineer_id): ApiPath<i32>,
) -> AppResult<Json<Engineer>> {
    Ok(Json(
        directory::get_engineer(state.store.as_ref(), engineer_id).await?,
    ))
}

pub async fn update_engineer(
    State(state): State<AppState>,
    ApiPath(engineer_id): ApiPath<i32>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<Engineer>> {
    Ok(Json(
        directory::update_engineer(state.store.as_ref(), engineer_id, &body).await?,
    ))
}

pub async fn delete_engineer(
    State(state): State<AppState>,
    ApiPath(engineer_id): ApiPath<i32>,
) -> AppResult<Json<Confirmation>> {
    Ok(Json(
        directory::delete_engineer(state.store.as_ref(), engineer_id).await?,
    ))
}

use axum::{
    extract::State,
    Json,
};
use serde_json::Value;

use super::{ApiJson, ApiPath};
use crate::{
    error::AppResult,
    models::Employee,
    services::{
        directory::{self, CreateEmployee},
        Confirmation,
    },
    state::AppState,
};

pub async fn list_employees(State(state): State<AppState>) -> AppResult<Json<Vec<Employee>>> {
    Ok(Json(directory::list_employees(state.store.as_ref()).await?))
}

pub async fn create_employee(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEmployee>,
) -> AppResult<Json<Employee>> {
    Ok(Json(
        directory::create_employee(state.store.as_ref(), payload).await?,
    ))
}

pub async fn get_employee(
    State(state): State<AppState>,
    ApiPath(employee_id): ApiPath<i32>,
) -> AppResult<Json<Employee>> {
    Ok(Json(
        directory::get_employee(state.store.as_ref(), employee_id).await?,
    ))
}

pub async fn update_employee(
    State(state): State<AppState>,
    ApiPath(employee_id): ApiPath<i32>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<Employee>> {
    Ok(Json(
        directory::update_employee(state.store.as_ref(), employee_id, &body).await?,
    ))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    ApiPath(employee_id): ApiPath<i32>,
) -> AppResult<Json<Confirmation>> {
    Ok(Json(
        directory::delete_employee(state.store.as_ref(), employee_id).await?,
    ))
}

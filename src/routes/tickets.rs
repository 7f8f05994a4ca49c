use axum::{
    extract::State,
    Json,
};
use serde_json::Value;

use super::{ApiJson, ApiPath};
use crate::{
    error::AppResult,
    models::TicketComment,
    services::{
        tickets::{
            self, AssignTicket, CreateComment, CreateTicket, KanbanBoard, TicketView,
            UpdateStatus,
        },
        Confirmation,
    },
    state::AppState,
};

pub async fn list_tickets(State(state): State<AppState>) -> AppResult<Json<Vec<TicketView>>> {
    Ok(Json(tickets::list_tickets(state.store.as_ref()).await?))
}

pub async fn kanban_board(State(state): State<AppState>) -> AppResult<Json<KanbanBoard>> {
    Ok(Json(tickets::kanban(state.store.as_ref()).await?))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTicket>,
) -> AppResult<Json<TicketView>> {
    Ok(Json(
        tickets::create_ticket(state.store.as_ref(), payload).await?,
    ))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    ApiPath(ticket_id): ApiPath<i32>,
) -> AppResult<Json<TicketView>> {
    Ok(Json(tickets::get_ticket(state.store.as_ref(), ticket_id).await?))
}

pub async fn update_ticket(
    State(state): State<AppState>,
    ApiPath(ticket_id): ApiPath<i32>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<TicketView>> {
    Ok(Json(
        tickets::update_ticket(state.store.as_ref(), ticket_id, &body).await?,
    ))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    ApiPath(ticket_id): ApiPath<i32>,
) -> AppResult<Json<Confirmation>> {
    Ok(Json(
        tickets::delete_ticket(state.store.as_ref(), ticket_id).await?,
    ))
}

pub async fn assign_ticket(
    State(state): State<AppState>,
    ApiPath(ticket_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<AssignTicket>,
) -> AppResult<Json<TicketView>> {
    Ok(Json(
        tickets::assign_ticket(state.store.as_ref(), ticket_id, payload).await?,
    ))
}

pub async fn update_ticket_status(
    State(state): State<AppState>,
    ApiPath(ticket_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateStatus>,
) -> AppResult<Json<TicketView>> {
    Ok(Json(
        tickets::update_status(state.store.as_ref(), ticket_id, payload).await?,
    ))
}

pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(ticket_id): ApiPath<i32>,
) -> AppResult<Json<Vec<TicketComment>>> {
    Ok(Json(
        tickets::list_comments(state.store.as_ref(), ticket_id).await?,
    ))
}

pub async fn add_comment(
    State(state): State<AppState>,
    ApiPath(ticket_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CreateComment>,
) -> AppResult<Json<TicketComment>> {
    Ok(Json(
        tickets::add_comment(state.store.as_ref(), ticket_id, payload).await?,
    ))
}

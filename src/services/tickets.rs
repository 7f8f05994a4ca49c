//! Ticket lifecycle: creation, partial edits, assignment, status changes,
//! comments and the kanban board.
//!
//! Status is an open string. Only the four [`KanbanColumn`] values show up on
//! the board; anything else is still stored and returned by the other views.
//! Assignment and commenting take the engineer id as given.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::Confirmation;
use crate::{
    error::{AppError, AppResult},
    models::{NewTicket, NewTicketComment, TicketChangeset, TicketComment, TicketWithNames},
    store::{StoreError, SupportStore},
    utils::{
        json::{classify_field, object_body},
        validation,
    },
};

pub const DEFAULT_STATUS: &str = "open";
pub const DEFAULT_PRIORITY: &str = "medium";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KanbanColumn {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl KanbanColumn {
    pub const ALL: [KanbanColumn; 4] = [
        KanbanColumn::Open,
        KanbanColumn::InProgress,
        KanbanColumn::Resolved,
        KanbanColumn::Closed,
    ];

    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "open" => Some(KanbanColumn::Open),
            "in_progress" => Some(KanbanColumn::InProgress),
            "resolved" => Some(KanbanColumn::Resolved),
            "closed" => Some(KanbanColumn::Closed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KanbanColumn::Open => "open",
            KanbanColumn::InProgress => "in_progress",
            KanbanColumn::Resolved => "resolved",
            KanbanColumn::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub employee_id: i32,
    pub engineer_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub employee: Option<PersonRef>,
    pub engineer: Option<PersonRef>,
}

impl From<TicketWithNames> for TicketView {
    fn from(row: TicketWithNames) -> Self {
        let ticket = row.ticket;
        Self {
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            status: ticket.status,
            priority: ticket.priority,
            employee_id: ticket.employee_id,
            engineer_id: ticket.engineer_id,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            employee: row.employee_name.map(|name| PersonRef { name }),
            engineer: row.engineer_name.map(|name| PersonRef { name }),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct KanbanBoard {
    pub open: Vec<TicketView>,
    pub in_progress: Vec<TicketView>,
    pub resolved: Vec<TicketView>,
    pub closed: Vec<TicketView>,
}

impl KanbanBoard {
    /// Buckets tickets by status, dropping those outside the four columns.
    pub fn from_tickets(tickets: impl IntoIterator<Item = TicketView>) -> Self {
        let mut board = KanbanBoard::default();
        for ticket in tickets {
            if let Some(column) = KanbanColumn::from_status(&ticket.status) {
                board.column_mut(column).push(ticket);
            }
        }
        board
    }

    pub fn column(&self, column: KanbanColumn) -> &[TicketView] {
        match column {
            KanbanColumn::Open => &self.open,
            KanbanColumn::InProgress => &self.in_progress,
            KanbanColumn::Resolved => &self.resolved,
            KanbanColumn::Closed => &self.closed,
        }
    }

    fn column_mut(&mut self, column: KanbanColumn) -> &mut Vec<TicketView> {
        match column {
            KanbanColumn::Open => &mut self.open,
            KanbanColumn::InProgress => &mut self.in_progress,
            KanbanColumn::Resolved => &mut self.resolved,
            KanbanColumn::Closed => &mut self.closed,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicket {
    #[validate(length(max = 255))]
    pub title: String,
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub status: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub priority: Option<String>,
    pub employee_id: i32,
    #[serde(default)]
    pub engineer_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignTicket {
    pub engineer_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatus {
    #[validate(length(max = 50))]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub engineer_id: i32,
    pub comment: String,
}

pub async fn list_tickets(store: &dyn SupportStore) -> AppResult<Vec<TicketView>> {
    let rows = store.list_tickets().await?;
    Ok(rows.into_iter().map(TicketView::from).collect())
}

pub async fn kanban(store: &dyn SupportStore) -> AppResult<KanbanBoard> {
    let rows = store.list_tickets().await?;
    Ok(KanbanBoard::from_tickets(rows.into_iter().map(TicketView::from)))
}

/// The employee reference is checked only by the storage layer.
pub async fn create_ticket(store: &dyn SupportStore, request: CreateTicket) -> AppResult<TicketView> {
    validation::request(&request)?;
    let title = validation::non_blank("title", &request.title)?;
    let now = Utc::now().naive_utc();
    let new_ticket = NewTicket {
        title,
        description: request.description,
        status: request
            .status
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        priority: request
            .priority
            .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
        employee_id: request.employee_id,
        engineer_id: request.engineer_id,
        created_at: now,
        updated_at: now,
    };

    let employee_id = new_ticket.employee_id;
    let row = store
        .insert_ticket(new_ticket)
        .await
        .map_err(|err| match err {
            StoreError::ForeignKeyViolation(_) => {
                AppError::bad_request(format!("Employee {employee_id} does not exist"))
            }
            other => other.into(),
        })?;

    tracing::info!(ticket_id = row.ticket.id, employee_id, "created ticket");
    Ok(row.into())
}

pub async fn get_ticket(store: &dyn SupportStore, id: i32) -> AppResult<TicketView> {
    store
        .find_ticket(id)
        .await?
        .map(TicketView::from)
        .ok_or_else(ticket_not_found)
}

/// Applies the fields present in `body`; `engineer_id: null` unassigns.
pub async fn update_ticket(store: &dyn SupportStore, id: i32, body: &Value) -> AppResult<TicketView> {
    let changes = ticket_changes(body)?;
    apply_changes(store, id, changes).await
}

pub async fn delete_ticket(store: &dyn SupportStore, id: i32) -> AppResult<Confirmation> {
    if !store.delete_ticket(id).await? {
        return Err(ticket_not_found());
    }

    tracing::info!(ticket_id = id, "deleted ticket");
    Ok(Confirmation::new("Ticket deleted successfully"))
}

pub async fn assign_ticket(
    store: &dyn SupportStore,
    id: i32,
    request: AssignTicket,
) -> AppResult<TicketView> {
    let changes = TicketChangeset {
        engineer_id: Some(Some(request.engineer_id)),
        ..Default::default()
    };
    let view = apply_changes(store, id, changes).await?;
    tracing::info!(ticket_id = id, engineer_id = request.engineer_id, "assigned ticket");
    Ok(view)
}

pub async fn update_status(
    store: &dyn SupportStore,
    id: i32,
    request: UpdateStatus,
) -> AppResult<TicketView> {
    validation::request(&request)?;
    let changes = TicketChangeset {
        status: Some(request.status),
        ..Default::default()
    };
    let view = apply_changes(store, id, changes).await?;
    tracing::info!(ticket_id = id, status = %view.status, "changed ticket status");
    Ok(view)
}

/// Never fails for an unknown ticket; it simply has no comments.
pub async fn list_comments(store: &dyn SupportStore, ticket_id: i32) -> AppResult<Vec<TicketComment>> {
    Ok(store.list_comments(ticket_id).await?)
}

pub async fn add_comment(
    store: &dyn SupportStore,
    ticket_id: i32,
    request: CreateComment,
) -> AppResult<TicketComment> {
    if store.find_ticket(ticket_id).await?.is_none() {
        return Err(ticket_not_found());
    }

    let comment = store
        .insert_comment(NewTicketComment {
            ticket_id,
            engineer_id: request.engineer_id,
            comment: request.comment,
            created_at: Utc::now().naive_utc(),
        })
        .await?;

    tracing::info!(ticket_id, comment_id = comment.id, "added ticket comment");
    Ok(comment)
}

pub fn ticket_changes(body: &Value) -> AppResult<TicketChangeset> {
    let body = object_body(body).map_err(AppError::bad_request)?;
    let required = |field: &str| {
        classify_field::<String>(body, field)
            .and_then(|value| value.required(field))
            .map_err(AppError::bad_request)
    };

    let title = required("title")?
        .map(|value| {
            let title = validation::non_blank("title", &value)?;
            validation::max_length("title", title, validation::TEXT_MAX)
        })
        .transpose()?;
    let description = required("description")?;
    let status = required("status")?
        .map(|value| validation::max_length("status", value, validation::LABEL_MAX))
        .transpose()?;
    let priority = required("priority")?
        .map(|value| validation::max_length("priority", value, validation::LABEL_MAX))
        .transpose()?;
    let engineer_id = classify_field::<i32>(body, "engineer_id")
        .map_err(AppError::bad_request)?
        .nullable();

    Ok(TicketChangeset {
        title,
        description,
        status,
        priority,
        engineer_id,
        updated_at: None,
    })
}

async fn apply_changes(
    store: &dyn SupportStore,
    id: i32,
    mut changes: TicketChangeset,
) -> AppResult<TicketView> {
    changes.updated_at = Some(Utc::now().naive_utc());
    store
        .update_ticket(id, changes)
        .await?
        .map(TicketView::from)
        .ok_or_else(ticket_not_found)
}

fn ticket_not_found() -> AppError {
    AppError::not_found("Ticket not found")
}

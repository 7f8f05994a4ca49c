use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = employees)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = employees)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = employees)]
pub struct EmployeeChangeset {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<Option<String>>,
}

impl EmployeeChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.department.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = engineers)]
pub struct Engineer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub specialization: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = engineers)]
pub struct NewEngineer {
    pub name: String,
    pub email: String,
    pub specialization: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = engineers)]
pub struct EngineerChangeset {
    pub name: Option<String>,
    pub email: Option<String>,
    pub specialization: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl EngineerChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.specialization.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = tickets)]
pub struct Ticket {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub employee_id: i32,
    pub engineer_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub employee_id: i32,
    pub engineer_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Every ticket mutation carries `updated_at`, so this changeset is never empty
/// once it reaches the store.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = tickets)]
pub struct TicketChangeset {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub engineer_id: Option<Option<i32>>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A ticket joined with the display names of its requester and assignee.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketWithNames {
    pub ticket: Ticket,
    pub employee_name: Option<String>,
    pub engineer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = ticket_comments)]
pub struct TicketComment {
    pub id: i32,
    pub ticket_id: i32,
    pub engineer_id: i32,
    pub comment: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket_comments)]
pub struct NewTicketComment {
    pub ticket_id: i32,
    pub engineer_id: i32,
    pub comment: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

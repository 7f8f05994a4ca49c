use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::models::{
    Employee, EmployeeChangeset, Engineer, EngineerChangeset, NewEmployee, NewEngineer,
    NewTicket, NewTicketComment, NewUser, TicketChangeset, TicketComment, TicketWithNames, User,
};

pub mod pg;

pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("storage task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<DieselError> for StoreError {
    fn from(value: DieselError) -> Self {
        match value {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::UniqueViolation(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::ForeignKeyViolation(info.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Persistence operations the services need. Lookups return `Ok(None)` for a
/// missing row; updates and deletes report whether a row was touched.
#[async_trait]
pub trait SupportStore: Send + Sync + 'static {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn find_employee(&self, id: i32) -> StoreResult<Option<Employee>>;
    async fn find_employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;
    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Employee>;
    async fn update_employee(
        &self,
        id: i32,
        changes: EmployeeChangeset,
    ) -> StoreResult<Option<Employee>>;
    async fn delete_employee(&self, id: i32) -> StoreResult<bool>;

    async fn list_engineers(&self) -> StoreResult<Vec<Engineer>>;
    async fn find_engineer(&self, id: i32) -> StoreResult<Option<Engineer>>;
    async fn find_engineer_by_email(&self, email: &str) -> StoreResult<Option<Engineer>>;
    async fn insert_engineer(&self, engineer: NewEngineer) -> StoreResult<Engineer>;
    async fn update_engineer(
        &self,
        id: i32,
        changes: EngineerChangeset,
    ) -> StoreResult<Option<Engineer>>;
    async fn delete_engineer(&self, id: i32) -> StoreResult<bool>;

    async fn list_tickets(&self) -> StoreResult<Vec<TicketWithNames>>;
    async fn find_ticket(&self, id: i32) -> StoreResult<Option<TicketWithNames>>;
    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<TicketWithNames>;
    async fn update_ticket(
        &self,
        id: i32,
        changes: TicketChangeset,
    ) -> StoreResult<Option<TicketWithNames>>;
    async fn delete_ticket(&self, id: i32) -> StoreResult<bool>;

    async fn list_comments(&self, ticket_id: i32) -> StoreResult<Vec<TicketComment>>;
    async fn insert_comment(&self, comment: NewTicketComment) -> StoreResult<TicketComment>;

    async fn find_user(&self, id: i32) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
}

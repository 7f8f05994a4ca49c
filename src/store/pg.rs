use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use super::{StoreError, StoreResult, SupportStore};
use crate::db::PgPool;
use crate::models::{
    Employee, EmployeeChangeset, Engineer, EngineerChangeset, NewEmployee, NewEngineer,
    NewTicket, NewTicketComment, NewUser, Ticket, TicketChangeset, TicketComment,
    TicketWithNames, User,
};
use crate::schema::{employees, engineers, ticket_comments, tickets, users};

type TicketRow = (Ticket, Option<String>, Option<String>);

/// Postgres-backed store. Each call checks out one pooled connection on the
/// blocking thread pool and returns it when the closure finishes.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| StoreError::Pool(err.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

fn into_ticket_with_names((ticket, employee_name, engineer_name): TicketRow) -> TicketWithNames {
    TicketWithNames {
        ticket,
        employee_name,
        engineer_name,
    }
}

fn load_ticket(conn: &mut PgConnection, id: i32) -> StoreResult<Option<TicketWithNames>> {
    let row = tickets::table
        .left_join(employees::table)
        .left_join(engineers::table)
        .filter(tickets::id.eq(id))
        .select((
            Ticket::as_select(),
            employees::name.nullable(),
            engineers::name.nullable(),
        ))
        .first::<TicketRow>(conn)
        .optional()?;
    Ok(row.map(into_ticket_with_names))
}

#[async_trait]
impl SupportStore for PgStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.run(|conn| {
            Ok(employees::table
                .order(employees::id.asc())
                .select(Employee::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn find_employee(&self, id: i32) -> StoreResult<Option<Employee>> {
        self.run(move |conn| {
            Ok(employees::table
                .find(id)
                .select(Employee::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn find_employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let email = email.to_string();
        self.run(move |conn| {
            Ok(employees::table
                .filter(employees::email.eq(&email))
                .select(Employee::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        self.run(move |conn| {
            Ok(diesel::insert_into(employees::table)
                .values(&employee)
                .returning(Employee::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    async fn update_employee(
        &self,
        id: i32,
        changes: EmployeeChangeset,
    ) -> StoreResult<Option<Employee>> {
        self.run(move |conn| {
            if changes.is_empty() {
                return Ok(employees::table
                    .find(id)
                    .select(Employee::as_select())
                    .first(conn)
                    .optional()?);
            }
            Ok(diesel::update(employees::table.find(id))
                .set(&changes)
                .returning(Employee::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_employee(&self, id: i32) -> StoreResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(employees::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_engineers(&self) -> StoreResult<Vec<Engineer>> {
        self.run(|conn| {
            Ok(engineers::table
                .order(engineers::id.asc())
                .select(Engineer::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn find_engineer(&self, id: i32) -> StoreResult<Option<Engineer>> {
        self.run(move |conn| {
            Ok(engineers::table
                .find(id)
                .select(Engineer::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn find_engineer_by_email(&self, email: &str) -> StoreResult<Option<Engineer>> {
        let email = email.to_string();
        self.run(move |conn| {
            Ok(engineers::table
                .filter(engineers::email.eq(&email))
                .select(Engineer::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn insert_engineer(&self, engineer: NewEngineer) -> StoreResult<Engineer> {
        self.run(move |conn| {
            Ok(diesel::insert_into(engineers::table)
                .values(&engineer)
                .returning(Engineer::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    async fn update_engineer(
        &self,
        id: i32,
        changes: EngineerChangeset,
    ) -> StoreResult<Option<Engineer>> {
        self.run(move |conn| {
            if changes.is_empty() {
                return Ok(engineers::table
                    .find(id)
                    .select(Engineer::as_select())
                    .first(conn)
                    .optional()?);
            }
            Ok(diesel::update(engineers::table.find(id))
                .set(&changes)
                .returning(Engineer::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_engineer(&self, id: i32) -> StoreResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(engineers::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_tickets(&self) -> StoreResult<Vec<TicketWithNames>> {
        self.run(|conn| {
            let rows = tickets::table
                .left_join(employees::table)
                .left_join(engineers::table)
                .order(tickets::id.asc())
                .select((
                    Ticket::as_select(),
                    employees::name.nullable(),
                    engineers::name.nullable(),
                ))
                .load::<TicketRow>(conn)?;
            Ok(rows.into_iter().map(into_ticket_with_names).collect())
        })
        .await
    }

    async fn find_ticket(&self, id: i32) -> StoreResult<Option<TicketWithNames>> {
        self.run(move |conn| load_ticket(conn, id)).await
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<TicketWithNames> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let id: i32 = diesel::insert_into(tickets::table)
                    .values(&ticket)
                    .returning(tickets::id)
                    .get_result(conn)?;
                load_ticket(conn, id)?
                    .ok_or(StoreError::Database(diesel::result::Error::NotFound))
            })
        })
        .await
    }

    async fn update_ticket(
        &self,
        id: i32,
        changes: TicketChangeset,
    ) -> StoreResult<Option<TicketWithNames>> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let updated = diesel::update(tickets::table.find(id))
                    .set(&changes)
                    .execute(conn)?;
                if updated == 0 {
                    return Ok(None);
                }
                load_ticket(conn, id)
            })
        })
        .await
    }

    async fn delete_ticket(&self, id: i32) -> StoreResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(tickets::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_comments(&self, ticket_id: i32) -> StoreResult<Vec<TicketComment>> {
        self.run(move |conn| {
            Ok(ticket_comments::table
                .filter(ticket_comments::ticket_id.eq(ticket_id))
                .order(ticket_comments::id.asc())
                .select(TicketComment::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn insert_comment(&self, comment: NewTicketComment) -> StoreResult<TicketComment> {
        self.run(move |conn| {
            Ok(diesel::insert_into(ticket_comments::table)
                .values(&comment)
                .returning(TicketComment::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        self.run(move |conn| {
            Ok(users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let username = username.to_string();
        self.run(move |conn| {
            Ok(users::table
                .filter(users::username.eq(&username))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let username = username.to_string();
        let email = email.to_string();
        self.run(move |conn| {
            Ok(users::table
                .filter(users::username.eq(&username).or(users::email.eq(&email)))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.run(move |conn| {
            Ok(diesel::insert_into(users::table)
                .values(&user)
                .returning(User::as_returning())
                .get_result(conn)?)
        })
        .await
    }
}

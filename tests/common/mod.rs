use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use supporthub::auth::jwt::JwtService;
use supporthub::config::AppConfig;
use supporthub::db;
use supporthub::models::{
    Employee, EmployeeChangeset, Engineer, EngineerChangeset, NewEmployee, NewEngineer,
    NewTicket, NewTicketComment, NewUser, Ticket, TicketChangeset, TicketComment,
    TicketWithNames, User,
};
use supporthub::routes;
use supporthub::state::AppState;
use supporthub::store::{StoreError, StoreResult, SupportStore};
use tokio::sync::Mutex;
use tower::util::ServiceExt;

#[derive(Default)]
struct Tables {
    sequences: HashMap<&'static str, i32>,
    employees: BTreeMap<i32, Employee>,
    engineers: BTreeMap<i32, Engineer>,
    tickets: BTreeMap<i32, Ticket>,
    comments: BTreeMap<i32, TicketComment>,
    users: BTreeMap<i32, User>,
}

impl Tables {
    fn next_id(&mut self, table: &'static str) -> i32 {
        let id = self.sequences.entry(table).or_insert(0);
        *id += 1;
        *id
    }

    fn with_names(&self, ticket: &Ticket) -> TicketWithNames {
        TicketWithNames {
            ticket: ticket.clone(),
            employee_name: self
                .employees
                .get(&ticket.employee_id)
                .map(|employee| employee.name.clone()),
            engineer_name: ticket
                .engineer_id
                .and_then(|id| self.engineers.get(&id))
                .map(|engineer| engineer.name.clone()),
        }
    }

    fn employee_exists(&self, id: i32) -> StoreResult<()> {
        if self.employees.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation(format!(
                "employee {id} does not exist"
            )))
        }
    }
}

/// In-process stand-in for the Postgres store with the same unique and
/// foreign key rules as the migrations.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[async_trait]
impl SupportStore for MemoryStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.tables.lock().await.employees.values().cloned().collect())
    }

    async fn find_employee(&self, id: i32) -> StoreResult<Option<Employee>> {
        Ok(self.tables.lock().await.employees.get(&id).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .employees
            .values()
            .find(|employee| employee.email == email)
            .cloned())
    }

    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let mut tables = self.tables.lock().await;
        if tables.employees.values().any(|e| e.email == employee.email) {
            return Err(StoreError::UniqueViolation("ix_employees_email".into()));
        }
        let id = tables.next_id("employees");
        let row = Employee {
            id,
            name: employee.name,
            email: employee.email,
            department: employee.department,
            created_at: employee.created_at,
        };
        tables.employees.insert(id, row.clone());
        Ok(row)
    }

    async fn update_employee(
        &self,
        id: i32,
        changes: EmployeeChangeset,
    ) -> StoreResult<Option<Employee>> {
        let mut tables = self.tables.lock().await;
        if let Some(email) = &changes.email {
            if tables
                .employees
                .values()
                .any(|e| &e.email == email && e.id != id)
            {
                return Err(StoreError::UniqueViolation("ix_employees_email".into()));
            }
        }
        let Some(row) = tables.employees.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(department) = changes.department {
            row.department = department;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_employee(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.tickets.values().any(|t| t.employee_id == id) {
            return Err(StoreError::ForeignKeyViolation(
                "tickets_employee_id_fkey".into(),
            ));
        }
        Ok(tables.employees.remove(&id).is_some())
    }

    async fn list_engineers(&self) -> StoreResult<Vec<Engineer>> {
        Ok(self.tables.lock().await.engineers.values().cloned().collect())
    }

    async fn find_engineer(&self, id: i32) -> StoreResult<Option<Engineer>> {
        Ok(self.tables.lock().await.engineers.get(&id).cloned())
    }

    async fn find_engineer_by_email(&self, email: &str) -> StoreResult<Option<Engineer>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .engineers
            .values()
            .find(|engineer| engineer.email == email)
            .cloned())
    }

    async fn insert_engineer(&self, engineer: NewEngineer) -> StoreResult<Engineer> {
        let mut tables = self.tables.lock().await;
        if tables.engineers.values().any(|e| e.email == engineer.email) {
            return Err(StoreError::UniqueViolation("ix_engineers_email".into()));
        }
        let id = tables.next_id("engineers");
        let row = Engineer {
            id,
            name: engineer.name,
            email: engineer.email,
            specialization: engineer.specialization,
            is_active: engineer.is_active,
            created_at: engineer.created_at,
        };
        tables.engineers.insert(id, row.clone());
        Ok(row)
    }

    async fn update_engineer(
        &self,
        id: i32,
        changes: EngineerChangeset,
    ) -> StoreResult<Option<Engineer>> {
        let mut tables = self.tables.lock().await;
        if let Some(email) = &changes.email {
            if tables
                .engineers
                .values()
                .any(|e| &e.email == email && e.id != id)
            {
                return Err(StoreError::UniqueViolation("ix_engineers_email".into()));
            }
        }
        let Some(row) = tables.engineers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(specialization) = changes.specialization {
            row.specialization = specialization;
        }
        if let Some(is_active) = changes.is_active {
            row.is_active = is_active;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_engineer(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables.lock().await.engineers.remove(&id).is_some())
    }

    async fn list_tickets(&self) -> StoreResult<Vec<TicketWithNames>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tickets
            .values()
            .map(|ticket| tables.with_names(ticket))
            .collect())
    }

    async fn find_ticket(&self, id: i32) -> StoreResult<Option<TicketWithNames>> {
        let tables = self.tables.lock().await;
        Ok(tables.tickets.get(&id).map(|ticket| tables.with_names(ticket)))
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<TicketWithNames> {
        let mut tables = self.tables.lock().await;
        tables.employee_exists(ticket.employee_id)?;
        let id = tables.next_id("tickets");
        let row = Ticket {
            id,
            title: ticket.title,
            description: ticket.description,
            status: ticket.status,
            priority: ticket.priority,
            employee_id: ticket.employee_id,
            engineer_id: ticket.engineer_id,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        };
        tables.tickets.insert(id, row.clone());
        Ok(tables.with_names(&row))
    }

    async fn update_ticket(
        &self,
        id: i32,
        changes: TicketChangeset,
    ) -> StoreResult<Option<TicketWithNames>> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables.tickets.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        if let Some(priority) = changes.priority {
            row.priority = priority;
        }
        if let Some(engineer_id) = changes.engineer_id {
            row.engineer_id = engineer_id;
        }
        if let Some(updated_at) = changes.updated_at {
            row.updated_at = updated_at;
        }
        let row = row.clone();
        Ok(Some(tables.with_names(&row)))
    }

    async fn delete_ticket(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables.lock().await.tickets.remove(&id).is_some())
    }

    async fn list_comments(&self, ticket_id: i32) -> StoreResult<Vec<TicketComment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .values()
            .filter(|comment| comment.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: NewTicketComment) -> StoreResult<TicketComment> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id("ticket_comments");
        let row = TicketComment {
            id,
            ticket_id: comment.ticket_id,
            engineer_id: comment.engineer_id,
            comment: comment.comment,
            created_at: comment.created_at,
        };
        tables.comments.insert(id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username || user.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::UniqueViolation("ix_users_username".into()));
        }
        let id = tables.next_id("users");
        let row = User {
            id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            is_admin: user.is_admin,
            created_at: user.created_at,
        };
        tables.users.insert(id, row.clone());
        Ok(row)
    }
}

impl MemoryStore {
    #[allow(dead_code)]
    pub async fn remove_user(&self, id: i32) -> bool {
        self.tables.lock().await.users.remove(&id).is_some()
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/supporthub_test".to_string(),
        database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_issuer: "test-issuer".to_string(),
        jwt_audience: "test-audience".to_string(),
        jwt_expiry_minutes: 30,
        cors_allowed_origins: vec!["http://localhost:4000".to_string()],
        protect_resource_routes: false,
        seed_admin: false,
        admin_username: "admin".to_string(),
        admin_email: "admin@supporthub.com".to_string(),
        admin_password: "admin123".to_string(),
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::default());
        let store_for_state: Arc<dyn SupportStore> = store.clone();
        let jwt = JwtService::from_config(&config);
        let state = AppState::new(store_for_state, config, jwt);
        let router = routes::create_router(state.clone());
        Self {
            state,
            store,
            router,
        }
    }

    #[allow(dead_code)]
    pub async fn register_user(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let response = self
            .post_json(
                "/api/auth/register",
                &serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": password,
                }),
                None,
            )
            .await?;
        ensure!(
            response.status() == StatusCode::OK,
            "register failed with status {}",
            response.status()
        );
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn login_token(&self, username: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "/api/auth/login",
                &LoginPayload { username, password },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        #[derive(serde::Deserialize)]
        struct LoginResponse {
            access_token: String,
        }
        let parsed: LoginResponse = body_json(response).await?;
        Ok(parsed.access_token)
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PUT, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn post_raw(&self, path: &str, body: &'static str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        self.send(request).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty())?).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::DELETE).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty())?).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body))?).await
    }

    async fn send(&self, request: Request<Body>) -> Result<hyper::Response<Body>> {
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn body_json<T: DeserializeOwned>(response: hyper::Response<Body>) -> Result<T> {
    let body = body_to_vec(response.into_body()).await?;
    serde_json::from_slice(&body).map_err(|err| {
        anyhow!(
            "failed to decode {}: {err}",
            String::from_utf8_lossy(&body)
        )
    })
}

use axum::http::HeaderValue;
use axum::{
    extract::{FromRequest, FromRequestParts},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{auth::AuthenticatedUser, error::AppError, state::AppState};

pub mod auth;
pub mod employees;
pub mod engineers;
pub mod health;
pub mod tickets;

/// `axum::Json` whose rejections render as the API's JSON error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with the same JSON error body on bad segments.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

pub fn create_router(state: AppState) -> Router<()> {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let employees_routes = Router::new()
        .route(
            "/",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/:id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        );

    let engineers_routes = Router::new()
        .route(
            "/",
            get(engineers::list_engineers).post(engineers::create_engineer),
        )
        .route(
            "/:id",
            get(engineers::get_engineer)
                .put(engineers::update_engineer)
                .delete(engineers::delete_engineer),
        );

    let tickets_routes = Router::new()
        .route("/", get(tickets::list_tickets).post(tickets::create_ticket))
        .route("/kanban", get(tickets::kanban_board))
        .route(
            "/:id",
            get(tickets::get_ticket)
                .put(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
        .route("/:id/assign", post(tickets::assign_ticket))
        .route("/:id/status", patch(tickets::update_ticket_status))
        .route(
            "/:id/comments",
            get(tickets::list_comments).post(tickets::add_comment),
        );

    let mut resource_routes = Router::new()
        .nest("/api/employees", employees_routes)
        .nest("/api/engineers", engineers_routes)
        .nest("/api/tickets", tickets_routes);

    if state.config.protect_resource_routes {
        resource_routes = resource_routes.layer(middleware::from_extractor_with_state::<
            AuthenticatedUser,
            _,
        >(state.clone()));
    }

    Router::new()
        .merge(resource_routes)
        .nest("/api/auth", auth_routes)
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

use supporthub::{
    auth::jwt::JwtService,
    config::AppConfig,
    db, routes,
    services::auth::ensure_admin,
    state::AppState,
    store::{PgStore, SupportStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        protect_resource_routes = config.protect_resource_routes,
        "loaded backend configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;

    let lock_name = db::migration_lock_name(&config.database_url);
    let migration_pool = pool.clone();
    let applied = tokio::task::spawn_blocking(move || db::run_migrations(&migration_pool, &lock_name))
        .await
        .context("migration task panicked")??;
    tracing::info!(applied, "database schema is up to date");

    let store: Arc<dyn SupportStore> = Arc::new(PgStore::new(pool));

    if config.seed_admin {
        let created = ensure_admin(
            store.as_ref(),
            &config.admin_username,
            &config.admin_email,
            &config.admin_password,
        )
        .await
        .map_err(|err| anyhow::anyhow!("failed to seed admin user: {err}"))?;
        if created {
            tracing::info!(username = %config.admin_username, "created default admin user");
        } else {
            tracing::info!(username = %config.admin_username, "admin user already exists");
        }
    }

    let jwt = JwtService::from_config(&config);
    let address = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(store, config, jwt);
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(%address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        tracing::info!("api received shutdown signal");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

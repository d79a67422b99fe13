use std::sync::Arc;

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AdminConfig, AppConfig};
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth::AppState};
use service::auth::{AdminAuthConfig, AdminAuthService};
use service::catalog::{repo::seaorm::SeaOrmCatalogRepository, CatalogService};

/// Used only when no secret is configured; tokens signed with it are forgeable.
const DEV_JWT_SECRET: &str = "dev-secret-change-me";

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Build the admin auth service; a plaintext password is hashed here, once.
pub fn admin_auth_from_config(cfg: &AdminConfig) -> Result<AdminAuthService, StartupError> {
    let jwt_secret = if cfg.jwt_secret.trim().is_empty() {
        warn!("admin.jwt_secret not set; falling back to the development secret");
        DEV_JWT_SECRET.to_string()
    } else {
        cfg.jwt_secret.clone()
    };
    let token_ttl = chrono::Duration::hours(cfg.token_ttl_hours);

    let auth_cfg = match (&cfg.password_hash, &cfg.password) {
        (Some(hash), _) => AdminAuthConfig {
            username: cfg.username.clone(),
            password_hash: hash.clone(),
            jwt_secret,
            token_ttl,
        },
        (None, Some(plain)) => AdminAuthConfig::with_plain_password(cfg.username.clone(), plain, jwt_secret, token_ttl)
            .map_err(|e| StartupError::InvalidConfig(e.to_string()))?,
        (None, None) => return Err(StartupError::InvalidConfig("admin password is not configured".into())),
    };
    AdminAuthService::new(auth_cfg).map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

/// Connect, migrate once and assemble the shared handler state.
async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Runtime(format!("migration failed: {e}")))?;
        info!("database migrations applied");
    }

    let auth = admin_auth_from_config(&cfg.admin)?;
    let catalog = CatalogService::new(Arc::new(SeaOrmCatalogRepository { db }));
    Ok(AppState { catalog, auth })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl_c; shutdown only by process kill");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Process setup done exactly once: `.env`, logging, then the validated config.
pub fn bootstrap() -> Result<AppConfig, StartupError> {
    dotenv().ok();
    init_logging_from_env();
    AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

/// Build the app from an already loaded config and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(&cfg.server.static_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors(), &cfg.server.static_dir);

    let listener = tokio::net::TcpListener::bind((cfg.server.host.as_str(), cfg.server.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, static_dir = %cfg.server.static_dir, "starting server");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, ServerConfig};
use migration::MigratorTrait;
use service::catalog::repo::seaorm::SeaOrmEntryRepository;
use service::users::repo::seaorm::SeaOrmUserRepository;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.host, cfg.port).parse()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, draining connections");
}

/// Connect, migrate, seed the bootstrap admin and assemble the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    let state = ServerState::new(
        Arc::new(SeaOrmUserRepository::new(db.clone())),
        Arc::new(SeaOrmEntryRepository::new(db)),
        &cfg.auth,
        &cfg.catalog,
    );
    if let Some(seed) = &cfg.auth.bootstrap_admin {
        let admin = state.users.ensure_admin(seed).await?;
        info!(user_id = admin.id, username = %admin.username, "bootstrap admin ready");
    }
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: build the app and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

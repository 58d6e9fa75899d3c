// rest/mod.rs — Public REST API server.
//
// Axum HTTP server bridging the studio frontend and the identity provider
// to the local store.
//
// Endpoints:
//   POST /api/v1/webhooks/identity
//   GET  /api/v1/spaces
//   GET  /api/v1/catalog
//   GET  /api/v1/health

pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(routes::health::health))
        // Identity-provider webhook (signature-authenticated)
        .route(
            "/api/v1/webhooks/identity",
            post(routes::webhook::identity_webhook),
        )
        // Sidebar spaces listing
        .route("/api/v1/spaces", get(routes::spaces::list_spaces))
        // Studio form options
        .route("/api/v1/catalog", get(routes::catalog::get_catalog))
        // The studio frontend runs on its own origin.
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

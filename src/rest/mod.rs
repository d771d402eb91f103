// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, local-only by default. Every /api route sits behind
// the bearer-token guard; /health is open.
//
// Endpoints:
//   GET    /health
//   GET    /api/tasks
//   POST   /api/tasks
//   PUT    /api/tasks/{id}
//   DELETE /api/tasks/{id}
//   GET    /api/tasks/export
//   POST   /api/tasks/upload   (multipart CSV)

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth;
use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let addr: SocketAddr = ctx.config.bind().parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let guarded = Router::new()
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/{id}",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/api/tasks/export", get(routes::tasks::export_tasks))
        .route("/api/tasks/upload", post(routes::tasks::upload_tasks))
        .route_layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::require_bearer,
        ));

    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health))
        .merge(guarded)
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

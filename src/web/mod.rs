pub mod error;
pub mod handlers;
pub mod store;
pub mod templates;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::Config;
use store::UploadStore;

/// Everything a request handler may touch.
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub store: UploadStore,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let store = UploadStore::new(config.stored_file());
        Self { config, store }
    }
}

pub fn router(ctx: Arc<AppContext>) -> Router {
    let body_limit = ctx.config.max_upload_bytes();
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/dropdown", get(handlers::dropdown))
        .route("/range", get(handlers::range))
        .route("/plot", post(handlers::plot))
        .route("/healthcheck", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(ctx)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(ctx: Arc<AppContext>, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    ctx.store
        .prepare()
        .with_context(|| format!("cannot create {}", ctx.config.upload_dir.display()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

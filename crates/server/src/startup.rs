use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use service::{open_storage, Storage};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;

/// Shared handler state: the record store chosen at startup.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

pub fn build_app(storage: Arc<dyn Storage>) -> Router {
    routes::build_router(AppState { storage }, build_cors())
}

/// Serve `app` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

/// Public entry: open the configured storage, bind and serve until `shutdown`.
pub async fn run<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let storage = open_storage(&cfg.storage).await?;
    info!(
        backend = %cfg.storage.backend,
        root_dir = %cfg.storage.root_dir,
        "starting server with {} storage",
        cfg.storage.backend
    );

    let listener = TcpListener::bind(cfg.server.bind_addr()).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "listening");
    serve(listener, build_app(storage), shutdown).await
}

use crate::routes;
use crate::templates::Templates;
use anyhow::Result;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::Key;
use pdf_chat_core::{QaCoordinator, SessionStoreRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<QaCoordinator>,
    /// Uploaded PDFs are written here under their original file name.
    pub upload_dir: PathBuf,
    pub templates: Arc<Templates>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(coordinator: QaCoordinator, upload_dir: impl Into<PathBuf>, cookie_key: Key) -> Result<Self> {
        Ok(Self {
            coordinator: Arc::new(coordinator),
            upload_dir: upload_dir.into(),
            templates: Arc::new(Templates::new()?),
            cookie_key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(routes::home).post(routes::upload))
        .route("/ask_pdf", post(routes::ask_pdf))
        .route("/reset", post(routes::reset))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drops session stores that outlived the registry TTL.
pub fn spawn_session_sweeper(registry: Arc<SessionStoreRegistry>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            registry.purge_expired(chrono::Utc::now()).await;
        }
    })
}

pub async fn serve(state: AppState, addr: &str, max_upload_bytes: usize) -> Result<()> {
    if let Some(ttl) = state.coordinator.registry().ttl() {
        let every = ttl.to_std().unwrap_or(Duration::from_secs(60)).min(Duration::from_secs(60));
        spawn_session_sweeper(Arc::clone(state.coordinator.registry()), every.max(Duration::from_secs(1)));
    }

    let app = create_router(state, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("pdf-chat listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

//! Webhook ingestion
//!
//! HTTPS listener that accepts update deliveries pushed by the platform
//! on `POST /<bot token>` and forwards them into the bot's event feed.
//! Handlers only enqueue; they never touch poll state.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use super::types::Update;

/// Errors from webhook serving.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid listen address: {0}")]
    Address(#[source] std::net::AddrParseError),

    #[error("failed to load TLS certificate/key: {0}")]
    Tls(#[source] std::io::Error),

    #[error("webhook server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the update-receiving router. The route path is the bot token,
/// which is what makes deliveries unguessable.
pub fn router(token: &str, feed: mpsc::Sender<Update>) -> Router {
    Router::new()
        .route(&format!("/{token}"), post(receive_update))
        .with_state(feed)
}

async fn receive_update(
    State(feed): State<mpsc::Sender<Update>>,
    Json(update): Json<Update>,
) -> StatusCode {
    if feed.send(update).await.is_err() {
        // The event loop is gone; the platform will retry after restart.
        warn!("dropping webhook update: event feed closed");
    }
    StatusCode::OK
}

/// Serve `router` over TLS until shutdown.
pub async fn serve(
    port: u16,
    cert_path: &Path,
    key_path: &Path,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), WebhookError> {
    let addr: SocketAddr = format!("0.0.0.0:{port}")
        .parse()
        .map_err(WebhookError::Address)?;

    let tls = load_tls(cert_path, key_path).await?;

    let handle = axum_server::Handle::new();
    let graceful = handle.clone();
    tokio::spawn(async move {
        let _ = shutdown.changed().await;
        graceful.graceful_shutdown(Some(Duration::from_secs(5)));
    });

    info!(%addr, "webhook listener started");
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(WebhookError::Serve)
}

/// Load the PEM certificate/key pair for the listener.
pub async fn load_tls(
    cert_path: &Path,
    key_path: &Path,
) -> Result<axum_server::tls_rustls::RustlsConfig, WebhookError> {
    axum_server::tls_rustls::RustlsConfig::from_pem_file(
        PathBuf::from(cert_path),
        PathBuf::from(key_path),
    )
    .await
    .map_err(|e| {
        error!(cert = %cert_path.display(), key = %key_path.display(), error = %e,
               "cannot load webhook TLS material");
        WebhookError::Tls(e)
    })
}

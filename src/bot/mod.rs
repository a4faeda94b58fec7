//! Bot runtime
//!
//! Owns the poll board and the gateway, merges both ingestion modes into
//! one ordered feed, and processes each update to completion before the
//! next. All poll state is read and written from this single consumer.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::poll::PollBoard;
use crate::telegram::api::{ApiError, Gateway};
use crate::telegram::types::Update;
use crate::telegram::{polling, webhook};

/// Capacity of the merged update feed.
const FEED_CAPACITY: usize = 256;

/// Why webhook delivery could not be brought up.
#[derive(Debug, thiserror::Error)]
enum WebhookSetupError {
    #[error(transparent)]
    Listener(#[from] webhook::WebhookError),

    #[error("webhook registration failed: {0}")]
    Register(#[from] ApiError),
}

/// Webhook listener settings, taken from the CLI.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Public host the platform should deliver to
    pub ip: String,
    pub port: u16,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// The bot: gateway client plus owned poll state.
pub struct WhoBot<G> {
    api: Arc<G>,
    board: PollBoard,
    token: String,
    webhook: Option<WebhookSettings>,
    username: RwLock<Option<String>>,
}

impl<G: Gateway + 'static> WhoBot<G> {
    pub fn new(
        api: Arc<G>,
        board: PollBoard,
        token: impl Into<String>,
        webhook: Option<WebhookSettings>,
    ) -> Self {
        Self {
            api,
            board,
            token: token.into(),
            webhook,
            username: RwLock::new(None),
        }
    }

    /// The poll board, for snapshotting after the loop exits.
    pub fn board(&self) -> &PollBoard {
        &self.board
    }

    /// Run until shutdown. Webhook delivery is preferred when configured;
    /// if registering it fails the bot falls back to long polling. On
    /// shutdown, updates already queued are drained before returning.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), ApiError> {
        let me = self.api.get_me().await?;
        info!(username = me.username.as_deref().unwrap_or("?"), "authorized");
        *self.username.write() = me.username.clone();

        let (feed_tx, mut feed_rx) = mpsc::channel::<Update>(FEED_CAPACITY);

        let mut webhook_active = false;
        if let Some(settings) = self.webhook.clone() {
            match self.start_webhook(settings, feed_tx.clone(), shutdown.clone()).await {
                Ok(()) => {
                    webhook_active = true;
                    info!("running on webhook");
                }
                Err(e) => {
                    warn!(error = %e, "webhook setup failed, switching to long polling");
                }
            }
        }
        if !webhook_active {
            tokio::spawn(polling::run(
                self.api.clone(),
                feed_tx.clone(),
                shutdown.clone(),
            ));
            info!("running on long polling");
        }
        drop(feed_tx);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                next = feed_rx.recv() => match next {
                    Some(update) => self.handle_update(update).await,
                    None => break,
                }
            }
            if *shutdown.borrow() {
                break;
            }
        }

        // Drain what the ingestion side already queued so a press that
        // raced the signal is not silently lost.
        while let Ok(update) = feed_rx.try_recv() {
            self.handle_update(update).await;
        }

        if webhook_active {
            if let Err(e) = self.api.delete_webhook().await {
                warn!(error = %e, "failed to remove webhook");
            }
        }
        Ok(())
    }

    async fn start_webhook(
        &self,
        settings: WebhookSettings,
        feed: mpsc::Sender<Update>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), WebhookSetupError> {
        // Fail fast on unreadable TLS material before telling the
        // platform to deliver here.
        webhook::load_tls(&settings.cert_path, &settings.key_path).await?;

        let url = format!("https://{}:{}/{}", settings.ip, settings.port, self.token);
        self.api
            .set_webhook(&url, Some(&settings.cert_path))
            .await?;

        let router = webhook::router(&self.token, feed);
        tokio::spawn(async move {
            if let Err(e) = webhook::serve(
                settings.port,
                &settings.cert_path,
                &settings.key_path,
                router,
                shutdown,
            )
            .await
            {
                error!(error = %e, "webhook listener exited");
            }
        });
        Ok(())
    }

    fn bot_username(&self) -> Option<String> {
        self.username.read().clone()
    }
}

//! Long-poll ingestion
//!
//! Background task that drains `getUpdates` and forwards each update into
//! the bot's single event feed. Stops on shutdown or when the feed's
//! receiver goes away.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::warn;

use super::api::{Gateway, LONG_POLL_TIMEOUT_SECS};
use super::types::Update;

/// Pause after a failed poll round before retrying.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Run the long-poll loop until shutdown.
pub async fn run<G: Gateway>(
    api: Arc<G>,
    feed: mpsc::Sender<Update>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset: i64 = 0;
    loop {
        let updates = tokio::select! {
            _ = shutdown.changed() => break,
            result = api.get_updates(offset, LONG_POLL_TIMEOUT_SECS) => result,
        };

        match updates {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if feed.send(update).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "long poll round failed");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }

        if *shutdown.borrow() {
            break;
        }
    }
}

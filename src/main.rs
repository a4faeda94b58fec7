use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use whosdown::bot::WhoBot;
use whosdown::cli::Cli;
use whosdown::poll::{snapshot, PollBoard};
use whosdown::telegram::TelegramApi;
use whosdown::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.prod);

    let board = PollBoard::new();
    if let Some(path) = &cli.save {
        match snapshot::load(path) {
            Ok(polls) => {
                info!(polls = polls.len(), path = %path.display(), "snapshot loaded");
                board.import(polls);
            }
            Err(e) => warn!(error = %e, "starting with an empty poll store"),
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let api = Arc::new(TelegramApi::new(cli.token.clone()));
    let bot = WhoBot::new(api, board, cli.token.clone(), cli.webhook_settings());

    if let Err(e) = bot.run(shutdown_rx).await {
        error!(error = %e, "bot failed to start");
        std::process::exit(1);
    }

    if let Some(path) = &cli.save {
        let polls = bot.board().export();
        match snapshot::save(path, &polls) {
            Ok(()) => info!(polls = polls.len(), path = %path.display(), "snapshot saved"),
            Err(e) => error!(error = %e, "failed to save snapshot"),
        }
    }

    info!("safe exit");
}

/// Wait for SIGINT or SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "cannot install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

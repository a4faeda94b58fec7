//! CLI definition
//!
//! Flag surface for the bot binary: credentials, delivery mode, and the
//! optional state snapshot. Long polling is the default; webhook delivery
//! needs `--enable-webhook` plus a public `--ip`.

use clap::Parser;
use std::path::PathBuf;

use crate::bot::WebhookSettings;

/// Who's Down — a Telegram group-poll bot.
#[derive(Parser, Debug)]
#[command(
    name = "whod",
    version = env!("CARGO_PKG_VERSION"),
    about = "Who's Down — group polls with live inline-keyboard voting"
)]
pub struct Cli {
    /// Telegram Bot API token.
    #[arg(short, long)]
    pub token: String,

    /// Receive updates over a webhook instead of long polling.
    #[arg(short = 'w', long)]
    pub enable_webhook: bool,

    /// Public IP or hostname the platform should deliver webhooks to.
    #[arg(long)]
    pub ip: Option<String>,

    /// Webhook listener port.
    #[arg(long, default_value_t = 8443)]
    pub webhook_port: u16,

    /// Webhook TLS certificate (PEM).
    #[arg(long, default_value = "./ignored/cert.pem")]
    pub webhook_cert: PathBuf,

    /// Webhook TLS private key (PEM).
    #[arg(long, default_value = "./ignored/key.key")]
    pub webhook_key: PathBuf,

    /// Snapshot file for carrying poll state across restarts.
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Production mode: JSON log output.
    #[arg(long)]
    pub prod: bool,
}

impl Cli {
    /// Webhook settings, when webhook delivery is both enabled and
    /// addressable. Enabling the flag without `--ip` stays on long
    /// polling.
    pub fn webhook_settings(&self) -> Option<WebhookSettings> {
        if !self.enable_webhook {
            return None;
        }
        let ip = self.ip.clone()?;
        Some(WebhookSettings {
            ip,
            port: self.webhook_port,
            cert_path: self.webhook_cert.clone(),
            key_path: self.webhook_key.clone(),
        })
    }
}

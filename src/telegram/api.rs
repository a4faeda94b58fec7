//! Telegram Bot API client
//!
//! Thin typed client over the HTTPS Bot API: every method is a POST of a
//! JSON body to `https://api.telegram.org/bot<token>/<method>`, answered
//! by an `{ok, result, description}` envelope.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

use super::types::{
    ApiResponse, InlineKeyboardMarkup, InlineQueryResultArticle, Message, MessageRef, Update, User,
};

/// Long-poll wait passed to `getUpdates`, in seconds.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 60;

/// Errors from Bot API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("response decode error: {0}")]
    Decode(String),
}

/// The outbound surface the bot drives. `TelegramApi` is the live
/// implementation; tests substitute a recording fake.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get_me(&self) -> Result<User, ApiError>;

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, ApiError>;

    async fn set_webhook(&self, url: &str, certificate: Option<&Path>) -> Result<(), ApiError>;

    async fn delete_webhook(&self) -> Result<(), ApiError>;

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: InlineKeyboardMarkup,
    ) -> Result<Message, ApiError>;

    async fn edit_message_text(
        &self,
        target: &MessageRef,
        text: &str,
        markup: InlineKeyboardMarkup,
    ) -> Result<(), ApiError>;

    async fn answer_callback_query(&self, id: &str, alert: Option<&str>) -> Result<(), ApiError>;

    async fn answer_inline_query(
        &self,
        id: &str,
        results: Vec<InlineQueryResultArticle>,
    ) -> Result<(), ApiError>;
}

/// Live Bot API client.
pub struct TelegramApi {
    client: reqwest::Client,
    token: String,
}

impl TelegramApi {
    pub fn new(token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build reqwest client");
        Self {
            client,
            token: token.into(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    /// POST a JSON body to a Bot API method and unwrap the envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.post(self.api_url(method)).json(&body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if !envelope.ok {
            return Err(ApiError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        envelope
            .result
            .ok_or_else(|| ApiError::Decode("missing result in ok response".to_string()))
    }
}

#[async_trait]
impl Gateway for TelegramApi {
    async fn get_me(&self) -> Result<User, ApiError> {
        self.call("getMe", serde_json::json!({}), None).await
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, ApiError> {
        // The HTTP timeout must outlive the server-side long-poll wait.
        self.call(
            "getUpdates",
            serde_json::json!({ "offset": offset, "timeout": timeout_secs }),
            Some(Duration::from_secs(timeout_secs + 15)),
        )
        .await
    }

    async fn set_webhook(&self, url: &str, certificate: Option<&Path>) -> Result<(), ApiError> {
        let mut form = reqwest::multipart::Form::new().text("url", url.to_string());
        if let Some(path) = certificate {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| ApiError::Network(format!("cannot read certificate: {e}")))?;
            form = form.part(
                "certificate",
                reqwest::multipart::Part::bytes(bytes).file_name("cert.pem"),
            );
        }

        let response = self
            .client
            .post(self.api_url("setWebhook"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let envelope: ApiResponse<bool> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if !envelope.ok {
            return Err(ApiError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), ApiError> {
        self.call::<bool>("deleteWebhook", serde_json::json!({}), None)
            .await
            .map(|_| ())
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: InlineKeyboardMarkup,
    ) -> Result<Message, ApiError> {
        self.call(
            "sendMessage",
            serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
                "reply_markup": markup,
            }),
            None,
        )
        .await
    }

    async fn edit_message_text(
        &self,
        target: &MessageRef,
        text: &str,
        markup: InlineKeyboardMarkup,
    ) -> Result<(), ApiError> {
        let mut body = serde_json::json!({
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
            "reply_markup": markup,
        });
        match target {
            MessageRef::Chat {
                chat_id,
                message_id,
            } => {
                body["chat_id"] = serde_json::json!(chat_id);
                body["message_id"] = serde_json::json!(message_id);
            }
            MessageRef::Inline(inline_message_id) => {
                body["inline_message_id"] = serde_json::json!(inline_message_id);
            }
        }
        // The edit result is the message for chat edits and `true` for
        // inline edits; neither is needed here.
        self.call::<serde_json::Value>("editMessageText", body, None)
            .await
            .map(|_| ())
    }

    async fn answer_callback_query(&self, id: &str, alert: Option<&str>) -> Result<(), ApiError> {
        let mut body = serde_json::json!({ "callback_query_id": id });
        if let Some(text) = alert {
            body["text"] = serde_json::json!(text);
            body["show_alert"] = serde_json::json!(true);
        }
        self.call::<bool>("answerCallbackQuery", body, None)
            .await
            .map(|_| ())
    }

    async fn answer_inline_query(
        &self,
        id: &str,
        results: Vec<InlineQueryResultArticle>,
    ) -> Result<(), ApiError> {
        self.call::<bool>(
            "answerInlineQuery",
            serde_json::json!({ "inline_query_id": id, "results": results }),
            None,
        )
        .await
        .map(|_| ())
    }
}

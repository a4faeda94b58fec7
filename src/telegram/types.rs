//! Telegram Bot API wire types
//!
//! Serde mirrors of the subset of the Bot API the bot consumes and
//! produces. Unknown fields are ignored on the way in; optional fields
//! are omitted on the way out.

use serde::{Deserialize, Serialize};

/// Envelope every Bot API method call returns.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One inbound update from the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
    #[serde(default)]
    pub chosen_inline_result: Option<ChosenInlineResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

/// A button press on an inline keyboard.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub inline_message_id: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

/// A user typing `@bot <query>` in any chat.
#[derive(Debug, Clone, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
}

/// Report that the user picked one of the offered inline results.
#[derive(Debug, Clone, Deserialize)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from: User,
    #[serde(default)]
    pub inline_message_id: Option<String>,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// The one inline result kind the bot offers.
#[derive(Debug, Clone, Serialize)]
pub struct InlineQueryResultArticle {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub title: String,
    pub input_message_content: InputTextMessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputTextMessageContent {
    pub message_text: String,
    pub parse_mode: String,
    pub disable_web_page_preview: bool,
}

impl InlineQueryResultArticle {
    /// Build an HTML article result.
    pub fn html(
        id: impl Into<String>,
        title: impl Into<String>,
        message_text: impl Into<String>,
    ) -> Self {
        Self {
            kind: "article".to_string(),
            id: id.into(),
            title: title.into(),
            input_message_content: InputTextMessageContent {
                message_text: message_text.into(),
                parse_mode: "HTML".to_string(),
                disable_web_page_preview: true,
            },
            reply_markup: None,
        }
    }

    pub fn with_reply_markup(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

/// Address of an editable poll message: an ordinary chat message or an
/// inline message living outside any chat the bot can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRef {
    Chat { chat_id: i64, message_id: i64 },
    Inline(String),
}

impl MessageRef {
    /// The key this message's poll is stored under.
    pub fn store_key(&self) -> String {
        match self {
            MessageRef::Chat { message_id, .. } => message_id.to_string(),
            MessageRef::Inline(id) => id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_command_update() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": {"id": 1, "first_name": "Ada", "username": "ada"},
                "chat": {"id": -100},
                "text": "/who Pizza##Yes#No"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.chat.id, -100);
        assert_eq!(msg.text.as_deref(), Some("/who Pizza##Yes#No"));
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn test_deserialize_callback_update_ignores_unknown_fields() {
        let json = r#"{
            "update_id": 11,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 2, "first_name": "Bob"},
                "inline_message_id": "im-9",
                "chat_instance": "whatever",
                "data": "1"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let cb = update.callback_query.unwrap();
        assert_eq!(cb.inline_message_id.as_deref(), Some("im-9"));
        assert_eq!(cb.data.as_deref(), Some("1"));
    }

    #[test]
    fn test_serialize_markup_omits_missing_payload() {
        let markup = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: "Yes".into(),
                callback_data: None,
            }]],
        };
        let json = serde_json::to_string(&markup).unwrap();
        assert_eq!(json, r#"{"inline_keyboard":[[{"text":"Yes"}]]}"#);
    }

    #[test]
    fn test_message_ref_store_key() {
        let chat = MessageRef::Chat {
            chat_id: -100,
            message_id: 42,
        };
        assert_eq!(chat.store_key(), "42");
        assert_eq!(MessageRef::Inline("im-9".into()).store_key(), "im-9");
    }
}

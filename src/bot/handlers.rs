//! Update handlers
//!
//! One handler per inbound event kind. Each runs to completion inside the
//! event loop: mutate poll state first, then perform the outbound calls.
//! Outbound failures are logged and swallowed; the next successful vote
//! re-renders the message from the already-updated state.

use tracing::{debug, error};

use super::WhoBot;
use crate::poll::engine::{apply_vote, VoteError};
use crate::poll::model::{Identity, Poll};
use crate::poll::{command, render};
use crate::telegram::api::Gateway;
use crate::telegram::types::{
    CallbackQuery, ChosenInlineResult, InlineKeyboardMarkup, InlineQuery, Message, MessageRef,
    Update,
};

impl<G: Gateway + 'static> WhoBot<G> {
    /// Dispatch one update. Exactly one of the message/callback/inline
    /// branches runs; a chosen-result report is processed regardless, as
    /// the platform may attach it to any update.
    pub(crate) async fn handle_update(&self, update: Update) {
        let Update {
            message,
            callback_query,
            inline_query,
            chosen_inline_result,
            ..
        } = update;

        if let Some(query) = callback_query {
            self.handle_callback(query).await;
        } else if let Some(message) = message {
            self.handle_message(message).await;
        } else if let Some(query) = inline_query {
            self.handle_inline_query(query).await;
        }

        if let Some(chosen) = chosen_inline_result {
            self.handle_chosen_result(chosen);
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        if let Some(from) = &message.from {
            debug!(user = from.id, text, "message received");
        }

        let username = self.bot_username();
        let Some(args) = command::who_arguments(text, username.as_deref()) else {
            return;
        };

        // A malformed command creates nothing and reports nothing; only a
        // debug line records the rejection.
        let (question, options) = match command::split_query(args) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "ignoring malformed poll command");
                return;
            }
        };

        let poll = Poll::new(question, options);
        let (text, markup) = rendered(&poll);
        match self.api.send_message(message.chat.id, &text, markup).await {
            Ok(sent) => self.board().put(sent.message_id.to_string(), poll),
            Err(e) => error!(error = %e, "failed to send poll message"),
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) {
        let outcome = self.apply_callback(&query);

        let alert = match outcome {
            Ok((target, text, markup)) => {
                if let Err(e) = self.api.edit_message_text(&target, &text, markup).await {
                    error!(error = %e, "failed to edit poll message");
                }
                None
            }
            Err(e) => Some(format!("Error! {e}")),
        };

        if let Err(e) = self
            .api
            .answer_callback_query(&query.id, alert.as_deref())
            .await
        {
            error!(error = %e, "failed to answer callback query");
        }
    }

    /// Apply a button press to the stored poll. On success the board
    /// already holds the updated poll and the rendered replacement
    /// message is returned; on failure the board is untouched.
    fn apply_callback(
        &self,
        query: &CallbackQuery,
    ) -> Result<(MessageRef, String, InlineKeyboardMarkup), VoteError> {
        let target = callback_target(query).ok_or(VoteError::MissingMessage)?;
        let key = target.store_key();

        let mut poll = self.board().get(&key).ok_or(VoteError::PollNotFound)?;
        let choice: usize = query
            .data
            .as_deref()
            .and_then(|data| data.parse().ok())
            .ok_or(VoteError::BadPayload)?;

        apply_vote(&mut poll, Identity::from(&query.from), choice)?;

        let (text, markup) = rendered(&poll);
        self.board().put(key, poll);
        Ok((target, text, markup))
    }

    async fn handle_inline_query(&self, query: InlineQuery) {
        let (question, options) = match command::split_query(&query.query) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "ignoring malformed inline query");
                return;
            }
        };

        let poll = Poll::new(question, options);
        let (text, markup) = rendered(&poll);
        let result_id = self.board().add_pending(poll.clone());

        let article =
            crate::telegram::types::InlineQueryResultArticle::html(result_id, poll.question, text)
                .with_reply_markup(markup);

        if let Err(e) = self.api.answer_inline_query(&query.id, vec![article]).await {
            error!(error = %e, "failed to answer inline query");
        }
    }

    /// Attach a chosen draft to the inline message the platform created
    /// for it. The draft is consumed either way.
    fn handle_chosen_result(&self, chosen: ChosenInlineResult) {
        let Some(poll) = self.board().take_pending(&chosen.result_id) else {
            return;
        };
        match chosen.inline_message_id {
            Some(inline_message_id) => self.board().put(inline_message_id, poll),
            None => debug!(result_id = %chosen.result_id, "chosen result carries no message id"),
        }
    }
}

/// Resolve which message a callback refers to.
fn callback_target(query: &CallbackQuery) -> Option<MessageRef> {
    if let Some(message) = &query.message {
        if message.message_id != 0 {
            return Some(MessageRef::Chat {
                chat_id: message.chat.id,
                message_id: message.message_id,
            });
        }
    }
    query
        .inline_message_id
        .clone()
        .map(MessageRef::Inline)
}

fn rendered(poll: &Poll) -> (String, InlineKeyboardMarkup) {
    (render::who_list(poll), render::keyboard(poll))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollBoard;
    use crate::telegram::api::ApiError;
    use crate::telegram::types::{Chat, InlineQueryResultArticle, User};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded outbound calls.
    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Send { chat_id: i64 },
        Edit { key: String, text: String },
        AnswerCallback { id: String, alert: Option<String> },
        AnswerInline { id: String, results: usize },
    }

    /// Gateway fake that records calls and hands out message ids. An
    /// optional canned batch is served through `get_updates` once; after
    /// that the call blocks like an idle long poll.
    struct FakeGateway {
        calls: Mutex<Vec<Call>>,
        next_message_id: Mutex<i64>,
        updates: Mutex<Option<Vec<Update>>>,
        fail_edit: bool,
    }

    impl FakeGateway {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                next_message_id: Mutex::new(100),
                updates: Mutex::new(None),
                fail_edit: false,
            }
        }

        fn failing_edit() -> Self {
            Self {
                fail_edit: true,
                ..Self::new()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn get_me(&self) -> Result<User, ApiError> {
            Ok(User {
                id: 1,
                first_name: "Who".into(),
                last_name: None,
                username: Some("whobot".into()),
            })
        }

        async fn get_updates(&self, _: i64, _: u64) -> Result<Vec<Update>, ApiError> {
            let batch = self.updates.lock().take();
            if let Some(batch) = batch {
                return Ok(batch);
            }
            std::future::pending::<()>().await;
            unreachable!()
        }

        async fn set_webhook(&self, _: &str, _: Option<&std::path::Path>) -> Result<(), ApiError> {
            Ok(())
        }

        async fn delete_webhook(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn send_message(
            &self,
            chat_id: i64,
            _text: &str,
            _markup: InlineKeyboardMarkup,
        ) -> Result<Message, ApiError> {
            self.calls.lock().push(Call::Send { chat_id });
            let mut next = self.next_message_id.lock();
            *next += 1;
            Ok(Message {
                message_id: *next,
                from: None,
                chat: Chat { id: chat_id },
                text: None,
            })
        }

        async fn edit_message_text(
            &self,
            target: &MessageRef,
            text: &str,
            _markup: InlineKeyboardMarkup,
        ) -> Result<(), ApiError> {
            self.calls.lock().push(Call::Edit {
                key: target.store_key(),
                text: text.to_string(),
            });
            if self.fail_edit {
                return Err(ApiError::Network("edit refused".into()));
            }
            Ok(())
        }

        async fn answer_callback_query(&self, id: &str, alert: Option<&str>) -> Result<(), ApiError> {
            self.calls.lock().push(Call::AnswerCallback {
                id: id.to_string(),
                alert: alert.map(str::to_string),
            });
            Ok(())
        }

        async fn answer_inline_query(
            &self,
            id: &str,
            results: Vec<InlineQueryResultArticle>,
        ) -> Result<(), ApiError> {
            self.calls.lock().push(Call::AnswerInline {
                id: id.to_string(),
                results: results.len(),
            });
            Ok(())
        }
    }

    fn bot_with(gateway: FakeGateway) -> (WhoBot<FakeGateway>, Arc<FakeGateway>) {
        let api = Arc::new(gateway);
        let bot = WhoBot::new(api.clone(), PollBoard::new(), "123:abc", None);
        (bot, api)
    }

    fn user(id: i64, first: &str) -> User {
        User {
            id,
            first_name: first.to_string(),
            last_name: None,
            username: None,
        }
    }

    fn command_update(text: &str) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": {"id": 7, "first_name": "Ada"},
                "chat": {"id": -55},
                "text": text
            }
        }))
        .unwrap()
    }

    fn callback(key_message_id: i64, from_id: i64, data: &str) -> CallbackQuery {
        CallbackQuery {
            id: format!("cb-{from_id}-{data}"),
            from: user(from_id, "Voter"),
            message: Some(Message {
                message_id: key_message_id,
                from: None,
                chat: Chat { id: -55 },
                text: None,
            }),
            inline_message_id: None,
            data: Some(data.to_string()),
        }
    }

    #[tokio::test]
    async fn test_who_command_creates_and_stores_poll() {
        let (bot, api) = bot_with(FakeGateway::new());

        bot.handle_update(command_update("/who Pizza##Yes#No")).await;

        assert_eq!(api.calls(), vec![Call::Send { chat_id: -55 }]);
        let poll = bot.board().get("101").expect("poll stored under sent id");
        assert_eq!(poll.question, "Pizza");
        assert_eq!(poll.choices, vec!["Yes", "No"]);
    }

    #[tokio::test]
    async fn test_bare_who_command_uses_defaults() {
        let (bot, _api) = bot_with(FakeGateway::new());

        bot.handle_update(command_update("/who")).await;

        let poll = bot.board().get("101").unwrap();
        assert_eq!(poll.question, "Who's Down");
        assert_eq!(poll.choices, vec!["Yes", "No"]);
    }

    #[tokio::test]
    async fn test_too_many_options_creates_nothing() {
        let (bot, api) = bot_with(FakeGateway::new());
        let text = format!("/who Q##{}", vec!["x"; 11].join("#"));

        bot.handle_update(command_update(&text)).await;

        assert!(api.calls().is_empty());
        assert!(bot.board().is_empty());
    }

    #[tokio::test]
    async fn test_non_command_message_is_ignored() {
        let (bot, api) = bot_with(FakeGateway::new());

        bot.handle_update(command_update("hello there")).await;

        assert!(api.calls().is_empty());
        assert!(bot.board().is_empty());
    }

    #[tokio::test]
    async fn test_vote_edits_message_and_acks() {
        let (bot, api) = bot_with(FakeGateway::new());
        bot.board()
            .put("42", Poll::new("Pizza?", vec!["Yes".into(), "No".into()]));

        bot.handle_callback(callback(42, 9, "0")).await;

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Edit { key, text } => {
                assert_eq!(key, "42");
                assert!(text.contains("<b>Yes (1):</b>\n• Voter"));
            }
            other => panic!("expected edit, got {other:?}"),
        }
        assert_eq!(
            calls[1],
            Call::AnswerCallback {
                id: "cb-9-0".to_string(),
                alert: None
            }
        );
        assert_eq!(bot.board().get("42").unwrap().voter_count(), 1);
    }

    #[tokio::test]
    async fn test_vote_on_unknown_poll_alerts_and_stores_nothing() {
        let (bot, api) = bot_with(FakeGateway::new());

        bot.handle_callback(callback(42, 9, "0")).await;

        assert_eq!(
            api.calls(),
            vec![Call::AnswerCallback {
                id: "cb-9-0".to_string(),
                alert: Some("Error! Cannot find question message".to_string())
            }]
        );
        assert!(bot.board().is_empty());
    }

    #[tokio::test]
    async fn test_vote_out_of_range_alerts_and_leaves_poll() {
        let (bot, api) = bot_with(FakeGateway::new());
        bot.board()
            .put("42", Poll::new("Pizza?", vec!["Yes".into(), "No".into()]));

        bot.handle_callback(callback(42, 9, "5")).await;

        assert_eq!(
            api.calls(),
            vec![Call::AnswerCallback {
                id: "cb-9-5".to_string(),
                alert: Some("Error! Cannot find choice in question".to_string())
            }]
        );
        assert_eq!(bot.board().get("42").unwrap().voter_count(), 0);
    }

    #[tokio::test]
    async fn test_vote_with_garbage_payload_alerts() {
        let (bot, api) = bot_with(FakeGateway::new());
        bot.board()
            .put("42", Poll::new("Pizza?", vec!["Yes".into(), "No".into()]));

        bot.handle_callback(callback(42, 9, "first")).await;

        match &api.calls()[0] {
            Call::AnswerCallback { alert: Some(text), .. } => {
                assert_eq!(text, "Error! Cannot read vote payload");
            }
            other => panic!("expected alert, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_store_updated() {
        // The vote lands in the store even when the display edit fails;
        // the next successful edit catches the message up.
        let (bot, _api) = bot_with(FakeGateway::failing_edit());
        bot.board()
            .put("42", Poll::new("Pizza?", vec!["Yes".into(), "No".into()]));

        bot.handle_callback(callback(42, 9, "1")).await;

        assert_eq!(bot.board().get("42").unwrap().voter_count(), 1);
    }

    #[tokio::test]
    async fn test_inline_query_parks_draft_and_answers_one_result() {
        let (bot, api) = bot_with(FakeGateway::new());

        let query = InlineQuery {
            id: "iq-1".to_string(),
            from: user(7, "Ada"),
            query: "Pizza##Yes#No".to_string(),
        };
        bot.handle_inline_query(query).await;

        assert_eq!(
            api.calls(),
            vec![Call::AnswerInline {
                id: "iq-1".to_string(),
                results: 1
            }]
        );
        assert_eq!(bot.board().pending_len(), 1);
        assert!(bot.board().is_empty());
    }

    #[tokio::test]
    async fn test_chosen_result_migrates_draft_to_live() {
        let (bot, _api) = bot_with(FakeGateway::new());
        let result_id = bot
            .board()
            .add_pending(Poll::new("Draft?", vec!["Yes".into(), "No".into()]));

        bot.handle_chosen_result(ChosenInlineResult {
            result_id: result_id.clone(),
            from: user(7, "Ada"),
            inline_message_id: Some("im-1".to_string()),
            query: String::new(),
        });

        assert_eq!(bot.board().pending_len(), 0);
        assert_eq!(bot.board().get("im-1").unwrap().question, "Draft?");

        // A second report for the same result finds nothing to migrate.
        bot.handle_chosen_result(ChosenInlineResult {
            result_id,
            from: user(7, "Ada"),
            inline_message_id: Some("im-2".to_string()),
            query: String::new(),
        });
        assert!(bot.board().get("im-2").is_none());
    }

    #[tokio::test]
    async fn test_inline_vote_targets_inline_message() {
        let (bot, api) = bot_with(FakeGateway::new());
        bot.board()
            .put("im-1", Poll::new("Pizza?", vec!["Yes".into(), "No".into()]));

        let query = CallbackQuery {
            id: "cb-inline".to_string(),
            from: user(9, "Voter"),
            message: None,
            inline_message_id: Some("im-1".to_string()),
            data: Some("0".to_string()),
        };
        bot.handle_callback(query).await;

        match &api.calls()[0] {
            Call::Edit { key, .. } => assert_eq!(key, "im-1"),
            other => panic!("expected edit, got {other:?}"),
        }
        assert_eq!(bot.board().get("im-1").unwrap().voter_count(), 1);
    }

    #[tokio::test]
    async fn test_run_processes_polled_updates_until_shutdown() {
        let gateway = FakeGateway::new();
        *gateway.updates.lock() = Some(vec![command_update("/who Pizza##Yes#No")]);

        let api = Arc::new(gateway);
        let bot = Arc::new(WhoBot::new(api, PollBoard::new(), "123:abc", None));
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let runner = bot.clone();
        let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

        for _ in 0..100 {
            if !bot.board().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let poll = bot.board().get("101").expect("poll created by the loop");
        assert_eq!(poll.question, "Pizza");

        let _ = shutdown_tx.send(true);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_full_toggle_round_trip_through_callbacks() {
        let (bot, _api) = bot_with(FakeGateway::new());
        bot.board()
            .put("42", Poll::new("Pizza?", vec!["Yes".into(), "No".into()]));

        bot.handle_callback(callback(42, 9, "0")).await;
        assert_eq!(bot.board().get("42").unwrap().voter_count(), 1);

        bot.handle_callback(callback(42, 9, "0")).await;
        assert_eq!(bot.board().get("42").unwrap().voter_count(), 0);
    }
}

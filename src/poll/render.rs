//! Poll rendering
//!
//! Produces the HTML message body (question plus per-choice voter lists)
//! and the inline keyboard for a poll.

use super::model::{Identity, Poll};
use crate::telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Header used for voters whose stored choice no longer maps to a label.
const UNKNOWN_CHOICE: &str = "Unknown Choice";

/// Escape text for interpolation into an HTML message body.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Display name for an identity: first name (plus last name), else last
/// name, else username, else "Unknown". Identities with a username are
/// rendered as a profile link.
pub fn format_identity(identity: &Identity) -> String {
    let name = match (&identity.first_name, &identity.last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.clone(),
        (None, Some(last)) => last.clone(),
        (None, None) => identity
            .username
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
    };

    match &identity.username {
        Some(username) => format!(
            r#"<a href="http://telegram.me/{}">{}</a>"#,
            username,
            escape(&name)
        ),
        None => escape(&name),
    }
}

/// Render the full message body: the question, a blank line, then one
/// block per choice with a bullet per assigned voter.
///
/// Voters with a stale out-of-range choice index are collected under a
/// synthetic "Unknown Choice" block after the real ones. Within a block,
/// voters appear in storage order, which toggle-off removal may have
/// shuffled.
pub fn who_list(poll: &Poll) -> String {
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); poll.choices.len()];
    let mut unknown: Vec<String> = Vec::new();

    for voter in &poll.voters {
        let bullet = format!("\n• {}", format_identity(&voter.identity));
        match buckets.get_mut(voter.choice) {
            Some(bucket) => bucket.push(bullet),
            None => unknown.push(bullet),
        }
    }

    let mut out = format!("{}\n", escape(&poll.question));
    for (label, bucket) in poll.choices.iter().zip(&buckets) {
        out.push_str(&format!(
            "\n<b>{} ({}):</b>{}",
            escape(label),
            bucket.len(),
            bucket.concat()
        ));
    }
    if !unknown.is_empty() {
        out.push_str(&format!(
            "\n<b>{} ({}):</b>{}",
            UNKNOWN_CHOICE,
            unknown.len(),
            unknown.concat()
        ));
    }
    out
}

/// Lay the choices out as an inline keyboard, two buttons per row, each
/// button carrying its zero-based choice index as a decimal payload.
pub fn keyboard(poll: &Poll) -> InlineKeyboardMarkup {
    let mut rows = Vec::with_capacity(poll.choices.len().div_ceil(2));
    for (row, pair) in poll.choices.chunks(2).enumerate() {
        rows.push(
            pair.iter()
                .enumerate()
                .map(|(col, label)| InlineKeyboardButton {
                    text: label.clone(),
                    callback_data: Some((row * 2 + col).to_string()),
                })
                .collect(),
        );
    }
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

//! Poll creation command grammar
//!
//! Parses the free text following the `/who` command (or an inline query)
//! into a question and an ordered list of option labels.
//!
//! Grammar: `question##option#option#...`. No text at all yields the
//! default question with no options; text without `##` is a bare question.
//! Text containing `##` more than once is treated as a bare question too —
//! the whole input becomes the question and the options are dropped. That
//! fallback is long-standing observable behavior and is pinned by test.

use thiserror::Error;

use super::model::{DEFAULT_QUESTION, MAX_CHOICES};

/// Errors from poll-creation parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Too many options: {0} (maximum 10)")]
    TooManyOptions(usize),
}

/// Split command text into a trimmed question and trimmed option labels.
///
/// The returned option list may be empty; the caller decides the default
/// choice set in that case.
pub fn split_query(query: &str) -> Result<(String, Vec<String>), ParseError> {
    let mut question = query;
    let mut options: Vec<String> = Vec::new();

    if query.is_empty() {
        question = DEFAULT_QUESTION;
    } else {
        let parts: Vec<&str> = query.split("##").collect();
        // Exactly one `##` separates question from options; anything else
        // (including several `##`) leaves the whole text as the question.
        if parts.len() == 2 {
            question = parts[0];
            options = parts[1].split('#').map(|s| s.trim().to_string()).collect();
        }
    }

    if options.len() > MAX_CHOICES {
        return Err(ParseError::TooManyOptions(options.len()));
    }

    Ok((question.trim().to_string(), options))
}

/// If `text` is the `/who` command (optionally addressed as `/who@bot`),
/// return the argument text that follows it.
pub fn who_arguments<'a>(text: &'a str, bot_username: Option<&str>) -> Option<&'a str> {
    let rest = text.strip_prefix('/')?;
    let (token, args) = match rest.split_once(char::is_whitespace) {
        Some((token, args)) => (token, args),
        None => (rest, ""),
    };
    let (command, target) = match token.split_once('@') {
        Some((command, target)) => (command, Some(target)),
        None => (token, None),
    };
    if command != "who" {
        return None;
    }
    // A command addressed to a different bot is not for us.
    if let Some(target) = target {
        match bot_username {
            Some(me) if target.eq_ignore_ascii_case(me) => {}
            _ => return None,
        }
    }
    Some(args)
}

//! Poll data model
//!
//! The in-memory shape of a running poll: the question, its fixed choice
//! labels, and the voters currently assigned to a choice.

use serde::{Deserialize, Serialize};

use crate::telegram::types::User;

/// Maximum number of choices a poll may carry.
pub const MAX_CHOICES: usize = 10;

/// Question used when the creation command carries no text at all.
pub const DEFAULT_QUESTION: &str = "Who's Down";

/// Choice set used when the creation command names no options.
pub fn default_choices() -> Vec<String> {
    vec!["Yes".to_string(), "No".to_string()]
}

/// Platform identity of a voter.
///
/// All name parts are optional; display formatting resolves a usable name
/// (or "Unknown") at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Platform-assigned user id
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        // The wire type carries the first name as a plain (possibly empty)
        // string; empty name parts are treated as absent.
        fn non_empty(s: &str) -> Option<String> {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Self {
            id: user.id,
            first_name: non_empty(&user.first_name),
            last_name: user.last_name.as_deref().and_then(non_empty),
            username: user.username.as_deref().and_then(non_empty),
        }
    }
}

/// A single identity's current selection within a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub identity: Identity,
    /// Index into the poll's choice list
    pub choice: usize,
}

/// A question with an ordered, fixed set of choice labels and the voters
/// currently assigned to them.
///
/// `choices` is fixed at creation and never mutated afterward; voter choice
/// indexes are therefore expected to stay in range, but rendering stays
/// defensive about stale values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub choices: Vec<String>,
    #[serde(default)]
    pub voters: Vec<Voter>,
}

impl Poll {
    /// Create a poll. An empty choice list falls back to the default
    /// Yes/No pair.
    pub fn new(question: impl Into<String>, choices: Vec<String>) -> Self {
        let choices = if choices.is_empty() {
            default_choices()
        } else {
            choices
        };
        Self {
            question: question.into(),
            choices,
            voters: Vec::new(),
        }
    }

    /// Number of voters currently assigned to any choice.
    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }
}

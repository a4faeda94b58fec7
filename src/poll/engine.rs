//! Vote engine
//!
//! Applies a single button press to a poll: pressing your current choice
//! removes your vote, pressing a different choice moves it, and a first
//! press adds you.

use thiserror::Error;

use super::model::{Identity, Poll, Voter};

/// Errors from the vote/callback flow. The display strings are shown to
/// the pressing user as an alert.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoteError {
    #[error("Cannot parse message")]
    MissingMessage,

    #[error("Cannot find question message")]
    PollNotFound,

    #[error("Cannot read vote payload")]
    BadPayload,

    #[error("Cannot find choice in question")]
    ChoiceOutOfRange,
}

/// Apply one vote event to `poll`.
///
/// An out-of-range `choice` fails without touching the poll. Toggle-off
/// removal uses `swap_remove`, so the relative order of the remaining
/// voters is not preserved.
pub fn apply_vote(poll: &mut Poll, identity: Identity, choice: usize) -> Result<(), VoteError> {
    if choice >= poll.choices.len() {
        return Err(VoteError::ChoiceOutOfRange);
    }

    match poll.voters.iter().position(|v| v.identity.id == identity.id) {
        Some(idx) if poll.voters[idx].choice == choice => {
            poll.voters.swap_remove(idx);
        }
        Some(idx) => poll.voters[idx].choice = choice,
        None => poll.voters.push(Voter { identity, choice }),
    }
    Ok(())
}

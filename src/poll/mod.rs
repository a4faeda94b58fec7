//! Poll core
//!
//! The poll state machine and aggregation engine: data model, creation
//! grammar, vote toggling, rendering, storage, and snapshots.

pub mod command;
pub mod engine;
pub mod model;
pub mod render;
pub mod snapshot;
pub mod store;

pub use command::{split_query, who_arguments, ParseError};
pub use engine::{apply_vote, VoteError};
pub use model::{Identity, Poll, Voter, DEFAULT_QUESTION, MAX_CHOICES};
pub use store::PollBoard;

//! whosdown library
//!
//! A Telegram "who's in" poll bot: `/who question##option#option` posts a
//! question with an inline keyboard, presses toggle votes, and the message
//! re-renders live. Poll state lives in memory and survives restarts via
//! an optional snapshot file.

pub mod bot;
pub mod cli;
pub mod logging;
pub mod poll;
pub mod telegram;

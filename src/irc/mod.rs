//! Minimal IRC client: line framing, registration, channel joins and
//! dispatch of chat commands to the bot.

pub mod client;
pub mod message;

pub use message::Message;

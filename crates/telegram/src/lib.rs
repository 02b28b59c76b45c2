//! Telegram front end for fieldex.
//!
//! Receives commands and `.txt` uploads through the Bot API (teloxide),
//! keeps per-user extraction settings, and replies with the extracted file.

pub mod bot;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod replies;
pub mod tempfiles;
pub mod transport;

pub use {
    bot::{Polling, start_polling},
    error::{Error, Result},
    handlers::CommandDispatcher,
    transport::{OutgoingDocument, TelegramTransport, Transport},
};

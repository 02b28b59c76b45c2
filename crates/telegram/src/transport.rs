use std::path::Path;

use {
    async_trait::async_trait,
    teloxide::{
        net::Download,
        prelude::*,
        types::{ChatId, InputFile, MessageId, ParseMode},
    },
    tokio::io::AsyncWriteExt,
    tracing::{debug, warn},
};

use crate::error::Result;

/// A file to deliver back to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDocument {
    pub file_name: String,
    pub data: Vec<u8>,
    /// HTML caption.
    pub caption: Option<String>,
}

/// Message delivery and file transfer, as seen by the command handlers.
///
/// Chat and message ids are the raw Bot API integers. Texts are HTML.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message, returning its message id.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i32>;

    async fn edit_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()>;

    /// Download the file identified by `file_id` into `dest`, replacing its
    /// contents.
    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<()>;

    async fn send_document(&self, chat_id: i64, document: OutgoingDocument) -> Result<()>;
}

/// [`Transport`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i32> {
        let chat = ChatId(chat_id);
        match self
            .bot
            .send_message(chat, text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(message) => Ok(message.id.0),
            Err(e) => {
                warn!(chat_id, error = %e, "telegram HTML send failed, retrying as plain text");
                let message = self.bot.send_message(chat, text).await?;
                Ok(message.id.0)
            },
        }
    }

    async fn edit_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<()> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<()> {
        let file = self.bot.get_file(file_id).await?;
        let mut out = tokio::fs::File::create(dest).await?;
        self.bot.download_file(&file.path, &mut out).await?;
        out.flush().await?;
        debug!(file_id, dest = %dest.display(), "downloaded telegram file");
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, document: OutgoingDocument) -> Result<()> {
        let size = document.data.len();
        let input = InputFile::memory(document.data).file_name(document.file_name.clone());
        let mut req = self.bot.send_document(ChatId(chat_id), input);
        if let Some(caption) = document.caption {
            req = req.caption(caption).parse_mode(ParseMode::Html);
        }
        req.await?;
        debug!(chat_id, file_name = %document.file_name, size, "sent document");
        Ok(())
    }
}

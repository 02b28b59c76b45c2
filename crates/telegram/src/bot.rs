use std::{sync::Arc, time::Duration};

use {
    fieldex_config::FieldexConfig,
    fieldex_sessions::SessionStore,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    commands::BOT_COMMANDS,
    handlers::{CommandDispatcher, Inbound},
    transport::TelegramTransport,
};

/// Long-polling timeout sent to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u32 = 30;

/// HTTP client timeout. Must exceed the long-polling timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(45);

/// Pause after a failed `getUpdates` call.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// A running polling loop.
pub struct Polling {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Polling {
    /// Resolves once the loop has been asked to stop, either through
    /// [`Polling::shutdown`] or because Telegram reported a competing poller.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }

    /// Stop polling and wait for the loop to exit. Uploads already being
    /// processed run to completion in their own tasks.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "telegram polling task panicked");
        }
    }
}

/// Connect to Telegram and start the polling loop.
///
/// Verifies the token with `getMe`, clears any webhook (dropping updates
/// queued while the bot was offline) and registers the command list. Each
/// incoming message is handled in its own task.
pub async fn start_polling(
    config: &FieldexConfig,
    sessions: Arc<SessionStore>,
) -> anyhow::Result<Polling> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(CLIENT_TIMEOUT)
        .build()?;
    let mut bot = Bot::with_client(config.telegram.token.expose_secret(), client);
    if let Some(api_url) = &config.telegram.api_url {
        bot = bot.set_api_url(reqwest::Url::parse(api_url)?);
    }

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    bot.delete_webhook().drop_pending_updates(true).send().await?;

    let commands: Vec<BotCommand> = BOT_COMMANDS
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "failed to register bot commands");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::new(TelegramTransport::new(bot.clone())),
        sessions,
        config.files.clone(),
        bot_username,
    ));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(poll_loop(bot, dispatcher, cancel.clone()));

    Ok(Polling { cancel, task })
}

async fn poll_loop(bot: Bot, dispatcher: Arc<CommandDispatcher>, cancel: CancellationToken) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = bot
                .get_updates()
                .offset(offset)
                .timeout(POLL_TIMEOUT_SECS)
                .allowed_updates(vec![AllowedUpdate::Message])
                .send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    let UpdateKind::Message(msg) = update.kind else {
                        debug!("ignoring non-message update");
                        continue;
                    };
                    let Some(inbound) = Inbound::from_message(&msg) else {
                        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
                        continue;
                    };
                    let dispatcher = Arc::clone(&dispatcher);
                    tokio::spawn(async move {
                        let user_id = inbound.user_id;
                        if let Err(e) = dispatcher.handle(inbound).await {
                            error!(user_id, error = %e, "error handling telegram message");
                        }
                    });
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram polling stopped: another instance is already running with this token");
                cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => {},
                }
            },
        }
    }

    info!("telegram polling stopped");
}

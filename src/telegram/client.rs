//! Telegram bot client - simple polling version.

use async_trait::async_trait;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::RequestError;

use crate::config::Settings;
use crate::daemon::Daemon;
use crate::directory::DisplayInfo;
use crate::error::{Error, GatewayError};
use crate::gateway::MessageGateway;

use super::commands::{execute, parse_command};

/// Delivers queue notifications as private Telegram messages.
///
/// Participant ids are Telegram user ids, which double as private chat ids.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Parse a participant id into a chat id. Empty ids are `None`.
fn recipient_chat(recipient: &str) -> Result<Option<ChatId>, GatewayError> {
    if recipient.is_empty() {
        return Ok(None);
    }
    recipient
        .parse::<i64>()
        .map(|id| Some(ChatId(id)))
        .map_err(|_| GatewayError::InvalidRecipient(recipient.to_string()))
}

#[async_trait]
impl MessageGateway for TelegramGateway {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), GatewayError> {
        let Some(chat_id) = recipient_chat(recipient)? else {
            tracing::debug!("Dropping message with no recipient: {}", text);
            return Ok(());
        };
        self.bot
            .send_message(chat_id, text)
            .await
            .map_err(|e| GatewayError::Delivery(e.to_string()))?;
        Ok(())
    }
}

/// Run the telegram bot daemon using simple polling.
pub async fn run_telegram_daemon(settings: Settings) -> Result<(), Error> {
    tracing::info!("Starting Telegram bot...");

    let token = settings
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| Error::Telegram("No bot token configured".to_string()))?;

    let bot = Bot::new(token);
    let daemon = Arc::new(Daemon::open(
        &settings,
        Arc::new(TelegramGateway::new(bot.clone())),
    )?);

    if let Err(e) = bot
        .set_my_commands(vec![
            teloxide::types::BotCommand::new("add", "Join the queue"),
            teloxide::types::BotCommand::new("del", "Leave the queue"),
            teloxide::types::BotCommand::new("kick", "Remove someone from the queue"),
            teloxide::types::BotCommand::new("pop", "Remove the current holder"),
            teloxide::types::BotCommand::new("clear", "Empty the queue"),
            teloxide::types::BotCommand::new("pass", "Hand your turn to the next person"),
            teloxide::types::BotCommand::new("ack", "Confirm you are using your turn"),
            teloxide::types::BotCommand::new("show", "Show the queue"),
            teloxide::types::BotCommand::new("help", "Show help"),
        ])
        .await
    {
        tracing::warn!("Failed to set commands: {}", e);
    }

    tracing::info!("Telegram bot commands set");

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let daemon = daemon.clone();
        async move { handle_message(bot, msg, daemon).await }
    })
    .await;

    Ok(())
}

/// Handle incoming messages.
async fn handle_message(bot: Bot, msg: Message, daemon: Arc<Daemon>) -> Result<(), RequestError> {
    let Some(command) = msg.text().and_then(parse_command) else {
        return Ok(());
    };
    let Some(user) = msg.from.as_ref() else {
        tracing::debug!("Ignoring command without a sender in chat {}", msg.chat.id);
        return Ok(());
    };

    let sender = user.id.0.to_string();
    let mut info = DisplayInfo::new(sender.clone(), user.full_name());
    if let Some(username) = &user.username {
        info = info.with_username(username.clone());
    }
    daemon.directory.remember(info);

    tracing::debug!("Command {:?} from {}", command, sender);
    let reply = execute(&daemon, &sender, command).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

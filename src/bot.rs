use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};
use teloxide::{ApiError, RequestError};
use tracing::{info, warn};

use crate::config::Config;
use crate::enforcement::{ActionError, ChatActions};
use crate::pipeline::{ChatKind, InboundMessage, Pipeline};
use crate::scoring::ScoringClient;

const START_TEXT: &str = "Hello! I'm a moderation bot.\n\
     Add me to your group and give me admin rights (delete messages) — \
     I'll help keep your chat clean and friendly!";

const HELP_TEXT: &str = "I detect and delete toxic or harmful messages.\n\n\
     To get started:\n\
     1. Add me to your group\n\
     2. Grant me admin rights with 'Delete Messages'\n\n\
     I'll take care of the rest!";

/// Shared application state
pub struct AppState {
    pipeline: Pipeline<ScoringClient, TelegramActions>,
}

/// Start the Telegram bot
pub async fn run(config: Config) -> Result<()> {
    let bot = Bot::new(&config.telegram.bot_token);

    let scorer = ScoringClient::new(config.scoring.clone())?;
    let actions = TelegramActions { bot: bot.clone() };
    let pipeline = Pipeline::new(scorer, actions, config.thresholds);
    let state = Arc::new(AppState { pipeline });

    info!("Starting Telegram bot...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    // Commands are answered directly and never moderated. Group clients may
    // suffix the bot name ("/help@somebot"), so match on the bare command.
    if let Some(command) = text.strip_prefix('/') {
        let command = command.split('@').next().unwrap_or(command);
        match command {
            "start" => {
                bot.send_message(msg.chat.id, START_TEXT).await?;
            }
            "help" => {
                bot.send_message(msg.chat.id, HELP_TEXT).await?;
            }
            _ => {}
        }
        return Ok(());
    }

    let user = match msg.from.as_ref() {
        Some(user) => user,
        None => return Ok(()),
    };

    let inbound = InboundMessage {
        message_id: msg.id.0,
        chat_id: msg.chat.id.0,
        chat_title: msg.chat.title().map(str::to_string),
        chat_kind: chat_kind(&msg),
        sender_id: user.id.0,
        sender_username: user.username.clone(),
        sender_first_name: Some(user.first_name.clone()),
        text: text.to_string(),
        sent_at: msg.date,
    };

    // The pipeline reports every outcome through logging and never returns
    // an error, so one message can never break the update stream.
    state.pipeline.process(&inbound).await;

    Ok(())
}

fn chat_kind(msg: &Message) -> ChatKind {
    if msg.chat.is_private() {
        ChatKind::Private
    } else if msg.chat.is_group() {
        ChatKind::Group
    } else if msg.chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Channel
    }
}

/// Telegram-backed platform actions, classifying API errors into the
/// failure kinds enforcement branches on.
struct TelegramActions {
    bot: Bot,
}

#[async_trait]
impl ChatActions for TelegramActions {
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), ActionError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map(|_| ())
            .map_err(classify_delete_error)
    }

    async fn send_direct_message(&self, user_id: u64, text: &str) -> Result<(), ActionError> {
        self.bot
            .send_message(ChatId(user_id as i64), text)
            .await
            .map(|_| ())
            .map_err(classify_notify_error)
    }
}

fn classify_delete_error(err: RequestError) -> ActionError {
    match err {
        RequestError::Api(ApiError::MessageCantBeDeleted) => ActionError::PermissionDenied,
        other => ActionError::Unexpected(other.to_string()),
    }
}

fn classify_notify_error(err: RequestError) -> ActionError {
    match err {
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::UserDeactivated
            | ApiError::CantInitiateConversation
            | ApiError::CantTalkWithBots,
        ) => ActionError::RecipientBlocked,
        other => ActionError::Unexpected(other.to_string()),
    }
}

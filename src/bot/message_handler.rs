//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::dialogue::{Event, Reply, SessionKey};

use crate::sheets::SheetBackend;

use super::ui_builder::create_menu_keyboard;
use super::BotContext;

/// Commands the bot understands, with their Spanish and English spellings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Help,
    Reload,
    Unknown,
}

impl Command {
    /// Parse the leading `/command` (or `/command@botname`) of a message
    ///
    /// Returns `None` for messages that are not commands, and for commands
    /// whose `@botname` suffix names a bot other than `bot_name`.
    pub fn parse(text: &str, bot_name: &str) -> Option<Self> {
        let (name, target) = split_command(text)?;
        if target.is_some_and(|target| !is_same_bot(target, bot_name)) {
            return None;
        }

        Some(match name.to_lowercase().as_str() {
            "start" | "iniciar" => Command::Start,
            "cancelar" | "cancel" => Command::Cancel,
            "ayuda" | "help" => Command::Help,
            "recargar" | "reload" => Command::Reload,
            _ => Command::Unknown,
        })
    }
}

/// Split `/name@bot` into the command name and its optional bot suffix
fn split_command(text: &str) -> Option<(&str, Option<&str>)> {
    let word = text.split_whitespace().next()?;
    let command = word.strip_prefix('/')?;
    Some(match command.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (command, None),
    })
}

fn is_same_bot(target: &str, bot_name: &str) -> bool {
    target.eq_ignore_ascii_case(bot_name.trim_start_matches('@'))
}

/// Whether a message is a command meant for another bot in the chat
pub fn is_for_other_bot(text: &str, bot_name: &str) -> bool {
    split_command(text)
        .and_then(|(_, target)| target)
        .is_some_and(|target| !is_same_bot(target, bot_name))
}

/// Session key for the sender of a message
pub fn session_key(msg: &Message) -> SessionKey {
    SessionKey::new(msg.chat.id.0, msg.from.as_ref().map_or(0, |user| user.id.0))
}

/// Send a conversation reply, attaching a keyboard for menus
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<()> {
    match reply {
        Reply::Text(text) => {
            bot.send_message(chat_id, text).await?;
        }
        Reply::Menu {
            prompt,
            state,
            options,
        } => {
            bot.send_message(chat_id, prompt)
                .reply_markup(create_menu_keyboard(state, &options))
                .await?;
        }
    }
    Ok(())
}

async fn handle_reload<B: SheetBackend>(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext<B>,
    language_code: Option<&str>,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|user| user.id.0);
    if !user_id.is_some_and(|id| ctx.is_operator(id)) {
        warn!(user_id = ?user_id, "Option reload refused for non-operator");
        bot.send_message(msg.chat.id, t_lang("reload-denied", language_code))
            .await?;
        return Ok(());
    }

    ctx.machine.reload_options().await;
    let summary = ctx
        .machine
        .options()
        .counts()
        .await
        .into_iter()
        .map(|(category, count)| format!("{} {}", count, t_lang(category.message_key(), language_code)))
        .collect::<Vec<_>>()
        .join(", ");
    info!(user_id = ?user_id, summary = %summary, "Options reloaded by operator");

    bot.send_message(
        msg.chat.id,
        t_args_lang("reload-done", &[("summary", summary.as_str())], language_code),
    )
    .await?;
    Ok(())
}

pub async fn message_handler<B: SheetBackend + 'static>(
    bot: Bot,
    msg: Message,
    ctx: Arc<BotContext<B>>,
) -> Result<()> {
    let Some(text) = msg.text() else {
        debug!(chat_id = %msg.chat.id, "Ignoring non-text message");
        return Ok(());
    };

    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str());

    let key = session_key(&msg);
    debug!(session = %key, message_length = text.len(), "Received text message");

    if is_for_other_bot(text, ctx.machine.mention()) {
        debug!(session = %key, "Ignoring command addressed to another bot");
        return Ok(());
    }

    let event = match Command::parse(text, ctx.machine.mention()) {
        Some(Command::Start) => Event::Start,
        Some(Command::Cancel) => Event::Cancel,
        Some(Command::Help) => {
            let help = t_args_lang("help-text", &[("mention", ctx.machine.mention())], language_code);
            bot.send_message(msg.chat.id, help).await?;
            return Ok(());
        }
        Some(Command::Reload) => return handle_reload(&bot, &msg, &ctx, language_code).await,
        Some(Command::Unknown) => {
            bot.send_message(msg.chat.id, t_lang("unknown-command", language_code))
                .await?;
            return Ok(());
        }
        None => {
            // In groups, only answer idle chatter that is addressed to the bot
            if !msg.chat.is_private()
                && ctx.machine.sessions().get(key).await.is_none()
                && !ctx.is_addressed(text)
            {
                return Ok(());
            }
            Event::Text(text.to_string())
        }
    };

    if let Some(reply) = ctx.machine.handle(key, event, language_code).await {
        send_reply(&bot, msg.chat.id, reply).await?;
    }

    Ok(())
}

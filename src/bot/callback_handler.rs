//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error};

// Import dialogue types
use crate::dialogue::{Event, MenuChoice, SessionKey};

use crate::sheets::SheetBackend;

use super::message_handler::send_reply;
use super::BotContext;

/// Handle callback queries from inline keyboards
pub async fn callback_handler<B: SheetBackend + 'static>(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<BotContext<B>>,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(msg) = &q.message else {
        return Ok(());
    };
    let Some(choice) = q.data.as_deref().and_then(MenuChoice::decode) else {
        debug!(user_id = %q.from.id, "Ignoring callback with unknown data");
        return Ok(());
    };

    let chat_id = msg.chat().id;
    let key = SessionKey::new(chat_id.0, q.from.id.0);
    let language_code = q.from.language_code.as_deref();

    let Some(reply) = ctx
        .machine
        .handle(key, Event::Choice(choice), language_code)
        .await
    else {
        return Ok(());
    };

    // The menu has been answered; drop its buttons so it cannot be pressed again
    if let Err(e) = bot.edit_message_reply_markup(chat_id, msg.id()).await {
        error!(user_id = %q.from.id, error = %e, "Failed to remove answered menu keyboard");
    }

    send_reply(&bot, chat_id, reply).await
}

//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles commands and text messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards for menu replies
//! - `dialogue_manager`: Manages dialogue state transitions and the final write

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

use std::collections::HashSet;
use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::sheets::SheetBackend;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use dialogue_manager::ConversationMachine;
pub use message_handler::message_handler;

/// Everything the handlers share
pub struct BotContext<B> {
    pub machine: ConversationMachine<B>,
    operators: HashSet<u64>,
}

impl<B: SheetBackend> BotContext<B> {
    pub fn new(machine: ConversationMachine<B>, operators: impl IntoIterator<Item = u64>) -> Self {
        Self {
            machine,
            operators: operators.into_iter().collect(),
        }
    }

    /// Whether a Telegram user may run operator commands
    pub fn is_operator(&self, user_id: u64) -> bool {
        self.operators.contains(&user_id)
    }

    /// Whether a message mentions the bot
    pub fn is_addressed(&self, text: &str) -> bool {
        text.to_lowercase().contains(self.machine.mention())
    }
}

/// Build the update handler tree: messages and menu button presses
pub fn build_handler<B: SheetBackend + 'static>() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler::<B>))
        .branch(Update::filter_callback_query().endpoint(callback_handler::<B>))
}

//! UI Builder module for creating keyboards from conversation replies

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::dialogue::{ConversationState, MenuChoice};

/// Longest button label before it is shortened
const MAX_BUTTON_CHARS: usize = 40;

/// Shorten a label to fit on a button, counting characters rather than bytes
pub fn button_label(option: &str) -> String {
    if option.chars().count() > MAX_BUTTON_CHARS {
        let head: String = option.chars().take(MAX_BUTTON_CHARS - 3).collect();
        format!("{head}...")
    } else {
        option.to_string()
    }
}

/// One button per row; each button carries its option index for `state`
pub fn create_menu_keyboard(state: ConversationState, options: &[String]) -> InlineKeyboardMarkup {
    let buttons = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            vec![InlineKeyboardButton::callback(
                button_label(option),
                MenuChoice::new(state, i).encode(),
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons)
}

//! # Quick Entry Parser
//!
//! Parses one-line transaction messages addressed to the bot, such as
//! `@bot me gasté $500 almuerzo equipo` or `@bot ingresé 1200 usd pago`.
//!
//! ## Grammar
//!
//! - The message must mention the bot; the mention is removed
//! - At least three words must remain and the first must be one of
//!   `me`, `gasté`, `gaste`, `ingresé`, `ingrese`, `ingresaron`
//! - `gasté`/`gaste` anywhere makes it an expense, otherwise an income
//! - The amount follows the verb (`me gasté 500`, `ingresé 500`)
//! - `usd`, `dólares` or `dolares` anywhere selects USD, otherwise ARS
//! - Every word after the amount forms the description

use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::transaction::{TransactionType, DATE_FORMAT};

/// Words a quick entry may start with
pub const LEADING_WORDS: [&str; 6] = ["me", "gasté", "gaste", "ingresé", "ingrese", "ingresaron"];
/// Words that mark an expense
pub const EXPENSE_WORDS: [&str; 2] = ["gasté", "gaste"];
/// Words that mark a dollar amount
pub const USD_WORDS: [&str; 3] = ["usd", "dólares", "dolares"];

pub const USD: &str = "USD";
pub const DEFAULT_CURRENCY: &str = "ARS";
pub const DEFAULT_DESCRIPTION: &str = "Sin descripción";

const MIN_WORDS: usize = 3;
const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

lazy_static! {
    /// Digits with at most one decimal separator
    static ref AMOUNT_REGEX: Regex =
        Regex::new(r"^\d+(?:[.,]\d+)?$").expect("Amount pattern should be valid");
}

/// Fields extracted from a quick-entry message
#[derive(Debug, Clone, PartialEq)]
pub struct QuickEntry {
    pub transaction_type: TransactionType,
    pub amount: String,
    pub currency: String,
    pub description: String,
    /// Entry date as `DD/MM/YYYY`
    pub date: String,
}

/// Why a message was not accepted as a quick entry
#[derive(Debug, Clone, PartialEq)]
pub enum QuickEntryError {
    /// The bot was not mentioned
    NotAddressed,
    /// Too few words or an unknown leading word
    UnrecognizedFormat,
    /// The amount word is not a number
    InvalidAmount(String),
}

impl std::fmt::Display for QuickEntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuickEntryError::NotAddressed => write!(f, "Message does not mention the bot"),
            QuickEntryError::UnrecognizedFormat => write!(f, "Unrecognized quick-entry format"),
            QuickEntryError::InvalidAmount(word) => write!(f, "Invalid amount: {word}"),
        }
    }
}

impl std::error::Error for QuickEntryError {}

/// Parser bound to the bot's mention
#[derive(Debug, Clone)]
pub struct QuickEntryParser {
    mention: String,
}

impl QuickEntryParser {
    pub fn new(mention: &str) -> Self {
        Self {
            mention: mention.trim().to_lowercase(),
        }
    }

    pub fn mention(&self) -> &str {
        &self.mention
    }

    /// Whether a message is addressed to the bot
    pub fn is_addressed(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.mention)
    }

    /// Parse a message, dating the entry `today`
    pub fn parse(&self, text: &str, today: NaiveDate) -> Result<QuickEntry, QuickEntryError> {
        let lowered = text.to_lowercase();
        if !lowered.contains(&self.mention) {
            return Err(QuickEntryError::NotAddressed);
        }

        let stripped = lowered.replace(&self.mention, " ");
        let words: Vec<&str> = stripped.split_whitespace().collect();
        debug!("Quick entry words: {:?}", words);

        if words.len() < MIN_WORDS || !LEADING_WORDS.contains(&words[0]) {
            return Err(QuickEntryError::UnrecognizedFormat);
        }

        let transaction_type = if words.iter().any(|w| EXPENSE_WORDS.contains(w)) {
            TransactionType::Expense
        } else {
            TransactionType::Income
        };

        // "me gasté 500" puts the amount third, "gasté 500" second
        let amount_index = if words[0] == "me" { 2 } else { 1 };
        let amount = parse_amount(words[amount_index])?;

        let currency = if USD_WORDS.iter().any(|w| lowered.contains(*w)) {
            USD
        } else {
            DEFAULT_CURRENCY
        };

        let description = words[amount_index + 1..].join(" ");
        let description = if description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description
        };

        info!(
            "Parsed quick entry: {} {} {} ({})",
            transaction_type, amount, currency, description
        );

        Ok(QuickEntry {
            transaction_type,
            amount,
            currency: currency.to_string(),
            description,
            date: today.format(DATE_FORMAT).to_string(),
        })
    }
}

/// Strip a leading currency symbol and check the rest is a number
pub fn parse_amount(word: &str) -> Result<String, QuickEntryError> {
    let digits = word.trim_start_matches(CURRENCY_SYMBOLS);
    if AMOUNT_REGEX.is_match(digits) {
        Ok(digits.to_string())
    } else {
        Err(QuickEntryError::InvalidAmount(word.to_string()))
    }
}

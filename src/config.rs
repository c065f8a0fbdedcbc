//! # Configuration Module
//!
//! Runtime settings read from the environment (after loading `.env`).

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::options::{OptionCategory, SheetNames};
use crate::sheets::CredentialsSource;

pub const DEFAULT_BASE_SHEET: &str = "Base";
pub const DEFAULT_MENTION: &str = "@contradormescopeguntabot";

/// Bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,
    /// Spreadsheet holding the base sheet and the option tabs
    pub spreadsheet_id: String,
    /// Service-account key location
    pub credentials: CredentialsSource,
    /// Tab receiving one row per transaction
    pub base_sheet: String,
    /// Tab name per option list
    pub option_sheets: SheetNames,
    /// Whether the first row of each option tab is a header
    pub skip_option_header: bool,
    /// Mention that routes a message to the quick-entry parser
    pub mention: String,
    /// Telegram user ids allowed to run operator commands
    pub operator_ids: Vec<u64>,
}

impl BotConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Read the configuration from a variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &str| get(name).with_context(|| format!("{name} must be set"));

        let credentials = match (get("GOOGLE_CREDENTIALS"), get("GOOGLE_CREDENTIALS_FILE")) {
            (Some(json), _) => CredentialsSource::Inline(json),
            (None, Some(path)) => CredentialsSource::File(PathBuf::from(path)),
            (None, None) => bail!("GOOGLE_CREDENTIALS or GOOGLE_CREDENTIALS_FILE must be set"),
        };

        let mut option_sheets = SheetNames::default();
        for category in OptionCategory::ALL {
            if let Some(sheet) = get(&format!("SHEET_{}", category.env_suffix())) {
                option_sheets.set(category, sheet);
            }
        }

        let skip_option_header = match get("OPTIONS_SKIP_HEADER") {
            Some(value) => parse_flag(&value).context("OPTIONS_SKIP_HEADER must be true or false")?,
            None => false,
        };

        let operator_ids = match get("OPERATOR_IDS") {
            Some(value) => parse_ids(&value).context("OPERATOR_IDS must be comma-separated user ids")?,
            None => Vec::new(),
        };

        Ok(Self {
            bot_token: require("TELEGRAM_BOT_TOKEN")?,
            spreadsheet_id: require("SPREADSHEET_ID")?,
            credentials,
            base_sheet: get("BASE_SHEET").unwrap_or_else(|| DEFAULT_BASE_SHEET.to_string()),
            option_sheets,
            skip_option_header,
            mention: get("BOT_MENTION").unwrap_or_else(|| DEFAULT_MENTION.to_string()),
            operator_ids,
        })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "sí" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => bail!("invalid flag value: {other}"),
    }
}

fn parse_ids(value: &str) -> Result<Vec<u64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| id.parse::<u64>().with_context(|| format!("invalid user id: {id}")))
        .collect()
}

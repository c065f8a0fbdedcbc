use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cashflow_bot::bot::{build_handler, BotContext, ConversationMachine};
use cashflow_bot::config::BotConfig;
use cashflow_bot::localization::init_localization;
use cashflow_bot::options::OptionCache;
use cashflow_bot::sheets::{GoogleSheets, ServiceAccountKey};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing();

    info!("Starting Cashflow Telegram Bot");

    let config = BotConfig::from_env()?;
    init_localization()?;

    // Without a spreadsheet connection the bot is useless: fail start-up
    let key = ServiceAccountKey::load(&config.credentials)
        .context("Failed to load service-account credentials")?;
    let sheets = Arc::new(
        GoogleSheets::connect(key, &config.spreadsheet_id)
            .await
            .context("Failed to connect to the spreadsheet")?,
    );

    // Option lists degrade to placeholders instead of failing
    let options = Arc::new(
        OptionCache::load_all(
            sheets.as_ref(),
            config.option_sheets.clone(),
            config.skip_option_header,
        )
        .await,
    );

    let machine = ConversationMachine::new(
        Arc::clone(&sheets),
        options,
        &config.base_sheet,
        &config.mention,
    );
    let ctx = Arc::new(BotContext::new(machine, config.operator_ids.clone()));

    let bot = Bot::new(config.bot_token);

    info!(base_sheet = %config.base_sheet, "Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, build_handler::<GoogleSheets>())
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

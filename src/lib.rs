//! # Cashflow Telegram Bot
//!
//! A Telegram bot that records income and expense transactions in a shared
//! Google spreadsheet, either through a guided step-by-step form or from a
//! one-line message mentioning the bot.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod localization;
pub mod options;
pub mod quick_entry;
pub mod row_writer;
pub mod sheets;
pub mod transaction;

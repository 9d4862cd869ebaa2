//! Telegram bot integration.

pub mod commands;
pub mod client;

pub use client::{run_telegram_daemon, TelegramGateway};

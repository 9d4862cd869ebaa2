//! CLI commands for TurnQueue using clap.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::{load_settings, load_settings_or_default, Settings};
use crate::core::{
    Clock, Estimate, EstimateTracker, JsonFileStore, PlausibilityBand, QueueState, Store,
    SystemClock,
};
use crate::daemon::{estimate_path, queue_path};
use crate::directory::ParticipantDirectory;
use crate::listeners::format_duration;
use crate::telegram::commands::render_queue;

/// TurnQueue - a Telegram bot that queues people for one shared resource.
#[derive(Parser)]
#[command(name = "turnqueue")]
#[command(version)]
#[command(about = "TurnQueue - take turns on a shared resource", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the Telegram bot in the foreground
    Start,

    /// Print the persisted queue
    Show,

    /// Print the persisted hold-time estimate
    Estimate,
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Start => cmd_start().await,
            Command::Show => cmd_show(),
            Command::Estimate => cmd_estimate(),
        }
    }
}

// Command implementations

async fn cmd_start() -> Result<()> {
    use crate::telegram::run_telegram_daemon;

    let settings = load_settings()?;
    println!("Starting TurnQueue...");
    tracing::info!(
        "Ack window {}, estimate band {}..{}",
        format_duration(settings.queue.ack_timeout()),
        format_duration(std::time::Duration::from_secs(settings.estimate.min_plausible_secs)),
        format_duration(std::time::Duration::from_secs(settings.estimate.max_plausible_secs)),
    );
    run_telegram_daemon(settings).await?;
    Ok(())
}

fn open_tracker(settings: &Settings, clock: Arc<dyn Clock>) -> Result<EstimateTracker> {
    let store = JsonFileStore::<Estimate>::new(estimate_path(settings)?);
    Ok(EstimateTracker::new(
        Arc::new(store),
        PlausibilityBand::from(&settings.estimate),
        clock,
    ))
}

fn cmd_show() -> Result<()> {
    let settings = load_settings_or_default();
    let path = queue_path(&settings)?;
    let state = JsonFileStore::<QueueState>::new(&path)
        .read()
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tracker = open_tracker(&settings, clock.clone())?;
    let directory = ParticipantDirectory::new();

    println!("{}", render_queue(&state, &directory, &tracker, "", clock.now()));
    Ok(())
}

fn cmd_estimate() -> Result<()> {
    let settings = load_settings_or_default();
    let tracker = open_tracker(&settings, Arc::new(SystemClock))?;
    let estimate = tracker
        .current()
        .context("Failed to read the hold-time estimate")?;
    let band = tracker.band();

    if estimate.sample_count == 0 {
        println!("No hold times recorded yet.");
    } else {
        println!(
            "Average hold: {} over {} samples",
            format_duration(estimate.average_hold_duration),
            estimate.sample_count
        );
    }
    println!(
        "Counted hold times: {} to {}",
        format_duration(band.min),
        format_duration(band.max)
    );
    Ok(())
}

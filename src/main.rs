//! TurnQueue - a Telegram bot that queues people for one shared resource.

use clap::Parser;
use std::process::ExitCode;

use turnqueue::{logging, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging; the handle flushes the file writer on exit
    let _logs = match logging::init() {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Parse command line arguments
    let args = Commands::parse();

    // Run the command
    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

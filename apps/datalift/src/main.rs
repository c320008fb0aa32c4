//! datalift - guided path from a record store to a trained model
//!
//! This is the main CLI application that orchestrates all operations
//! through the ops crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod setup;

use clap::Parser;
use std::process;
use tokio::select;
use tracing::{error, info};

use crate::cli::{Cli, Commands, DatasetCommands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::logging::init_tracing;
use crate::setup::SystemSetup;
use datalift_config::Config;
use datalift_events::EventReceiver;
use datalift_ops::{OperationResult, OpsContextBuilder};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    // Initialize tracing with JSON awareness
    init_tracing(json_mode, cli.global.debug);

    // Run the application and handle errors
    match run(cli).await {
        Ok(success) => {
            if !success {
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Application error: {}", e);
            if !json_mode {
                eprintln!("Error: {e}");
            }
            process::exit(1);
        }
    }
}

/// Main application logic; returns whether the operation succeeded
async fn run(cli: Cli) -> Result<bool, CliError> {
    info!("Starting datalift v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(&cli.global.config).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    if let Some(color) = &cli.global.color {
        config.general.color = *color;
    }

    // Initialize system setup
    let mut setup = SystemSetup::new(config.clone());
    setup.initialize().await?;

    // Create event channel
    let (event_sender, event_receiver) = datalift_events::channel();

    // Build operations context
    let ops_ctx = OpsContextBuilder::new()
        .with_config(config.clone())
        .with_event_sender(event_sender)
        .build()
        .await?;

    // Create output renderer and event handler
    let renderer = OutputRenderer::new(cli.global.json, config.general.color);
    let mut event_handler = EventHandler::new(
        !cli.global.json && renderer.colors_enabled(),
        cli.global.debug,
    );

    // Execute command with event handling
    let result =
        execute_command_with_events(cli.command, ops_ctx, event_receiver, &mut event_handler)
            .await?;

    // Render final result
    renderer.render_result(&result)?;

    info!("Command completed");
    Ok(result.is_success())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: datalift_ops::OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));

    // Handle events concurrently with command execution
    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(message) = event_receiver.try_recv() {
                    event_handler.handle_event(message);
                }
                return result;
            }

            // Event received
            message = event_receiver.recv() => {
                match message {
                    Some(message) => event_handler.handle_event(message),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    ctx: datalift_ops::OpsCtx,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::Preprocess => {
            let report = datalift_ops::preprocess(&ctx).await?;
            Ok(OperationResult::Pipeline(report))
        }

        Commands::Status => {
            let report = datalift_ops::status(&ctx).await?;
            Ok(OperationResult::Pipeline(report))
        }

        Commands::Restart { yes } => {
            if !yes && !confirm_restart()? {
                return Ok(OperationResult::Success("Restart cancelled".to_string()));
            }
            let message = datalift_ops::restart(&ctx).await?;
            Ok(OperationResult::Success(message))
        }

        Commands::Train { model_name, budget } => {
            if model_name.trim().is_empty() {
                return Err(CliError::InvalidArguments(
                    "model name must not be empty".to_string(),
                ));
            }
            let report = datalift_ops::train(&ctx, model_name.trim(), budget).await?;
            Ok(OperationResult::Training(report))
        }

        Commands::Projects => {
            let projects = datalift_ops::list_projects(&ctx).await?;
            Ok(OperationResult::Projects(projects))
        }

        Commands::Datasets { command } => match command {
            DatasetCommands::List => {
                let datasets = datalift_ops::list_datasets(&ctx).await?;
                Ok(OperationResult::Datasets(datasets))
            }
            DatasetCommands::Create { name, multilabel } => {
                let dataset = datalift_ops::create_dataset(&ctx, &name, multilabel).await?;
                Ok(OperationResult::Dataset(dataset))
            }
        },

        Commands::Buckets => {
            let buckets = datalift_ops::list_buckets(&ctx).await?;
            Ok(OperationResult::Buckets(buckets))
        }
    }
}

/// Ask the user to confirm a destructive restart
fn confirm_restart() -> Result<bool, CliError> {
    use std::io::Write;

    print!("Clear all pre-processing state and start over? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

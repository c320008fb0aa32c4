//! Command line interface definition

use clap::{Parser, Subcommand};
use datalift_types::ColorChoice;
use std::path::PathBuf;

/// datalift - lift labeled images from a record store into a managed ML dataset
#[derive(Parser)]
#[command(name = "datalift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lift labeled images from a record store into a managed ML dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the pre-processing pipeline (upload, manifest, import),
    /// resuming from persisted state
    #[command(alias = "pre")]
    Preprocess,

    /// Show persisted pipeline state and step outcomes
    Status,

    /// Clear all pipeline state and start over from stage 1
    Restart {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Trigger model training and wait for it to finish
    Train {
        /// Display name for the new model
        #[arg(long, value_name = "NAME")]
        model_name: String,

        /// Training budget in node hours
        #[arg(long, default_value_t = 8)]
        budget: u64,
    },

    /// List projects visible to the configured credentials
    Projects,

    /// Dataset management
    Datasets {
        #[command(subcommand)]
        command: DatasetCommands,
    },

    /// List the configured project's storage buckets
    Buckets,
}

/// Dataset subcommands
#[derive(Subcommand)]
pub enum DatasetCommands {
    /// List the configured project's datasets
    List,

    /// Create an image-classification dataset
    Create {
        /// Display name for the dataset
        name: String,

        /// Allow multiple labels per image
        #[arg(long)]
        multilabel: bool,
    },
}

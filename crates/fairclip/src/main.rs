//! fairclip CLI - CLIP embeddings and zero-shot fairness gaps on FairFace.
//!
//! Encodes every image of a FairFace split with a pretrained CLIP checkpoint,
//! classifies the embeddings against race or gender prompts, and reports
//! per-race accuracy and the race gap as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Encode the validation split and evaluate race prompts
//! FAIRFACE_PATH=/data/fairface fairclip --split val --labels raw_race
//!
//! # Re-evaluate existing embeddings with a different prompt set
//! fairclip --split val --labels ARGP --skip_encode
//!
//! # Classify a single image
//! fairclip classify 42 --split val --labels original_clip
//!
//! # Manage models
//! fairclip models download --backbone ViT-B-32 --datasource openai
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// fairclip - CLIP embeddings and zero-shot fairness gaps on FairFace.
#[derive(Parser, Debug)]
#[command(name = "fairclip")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: cli::run::RunArgs,
}

/// Available commands. Without one, fairclip encodes and evaluates a split.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a single image of a split from its stored embedding
    Classify(cli::classify::ClassifyArgs),

    /// Manage CLIP models (download, list, path)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // FAIRFACE_PATH may come from a .env file.
    dotenvy::dotenv().ok();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match fairclip_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `fairclip config path`."
            );
            fairclip_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("fairclip v{}", fairclip_core::VERSION);

    match cli.command {
        None => cli::run::execute(cli.run, config).await,
        Some(Commands::Classify(args)) => cli::classify::execute(args, config).await,
        Some(Commands::Models(args)) => cli::models::execute(args, config).await,
        Some(Commands::Config(args)) => cli::config::execute(args, config).await,
    }
}

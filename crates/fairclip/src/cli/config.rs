//! The `fairclip config` command for configuration management.

use clap::{Args, Subcommand};
use fairclip_core::encoder::checkpoint_dir;
use fairclip_core::{fairface, registry, Config};

use super::models::is_installed;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the configuration and the paths it resolves to
    Show,

    /// Show config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_toml()?);
            for line in resolved_summary(&config) {
                println!("# {line}");
            }
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
            if std::env::var_os(fairface::FAIRFACE_PATH_ENV).is_none() {
                println!(
                    "Set dataset.root or {} to point at the FairFace directory.",
                    fairface::FAIRFACE_PATH_ENV
                );
            }
        }
    }

    Ok(())
}

/// What the configured model and dataset settings resolve to on this machine.
fn resolved_summary(config: &Config) -> Vec<String> {
    let model = config.model.backbone.as_str();
    let source = config.model.datasource.as_str();

    let checkpoint = match registry::lookup(model, source) {
        Ok(pretrained) => format!(
            "checkpoint: {} ({})",
            checkpoint_dir(&config.model_dir(), pretrained).display(),
            if is_installed(config, pretrained) {
                "ready"
            } else {
                "not installed"
            }
        ),
        Err(e) => format!("checkpoint: {e}"),
    };

    let dataset = match fairface::dataset_root(None, config) {
        Ok(root) => format!("dataset root: {}", root.display()),
        Err(e) => format!("dataset root: {e}"),
    };

    vec![checkpoint, dataset]
}

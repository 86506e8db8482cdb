//! The `fairclip classify` command: zero-shot probabilities for one image.

use std::path::PathBuf;

use clap::Args;
use fairclip_core::{classifier, fairface, registry, ClipEncoder, Config};

use super::run::write_json;
use super::types::{DataArgs, ModelArgs};

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Zero-based index of the image in the split's manifest
    pub index: usize,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub data: DataArgs,

    /// Write the JSON result to a file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let (backbone, datasource) = args.model.resolve(&config);
    registry::lookup(&backbone, &datasource)?;

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let root = fairface::dataset_root(args.data.fairface_path.as_deref(), &config)?;
        let encoder = ClipEncoder::new(&backbone, &datasource, &config)?;

        let prediction = classifier::run(
            &encoder,
            &root,
            args.data.split(&config),
            args.index,
            args.data.labels(&config),
            config.classify.logit_scale,
        )?;

        write_json(&prediction, args.output.as_deref())
    })
    .await?
}

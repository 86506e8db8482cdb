//! Default command: encode a split, then evaluate zero-shot accuracy per race.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use fairclip_core::{
    classifier, fairface, registry, Classifier, ClipEncoder, Config, EmbeddingStore,
    EvaluationReport, Split,
};
use serde::Serialize;

use super::types::{DataArgs, ModelArgs};

/// Arguments for encoding and evaluating a split.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub data: DataArgs,

    /// Reuse embeddings already on disk instead of encoding
    #[arg(long = "skip_encode")]
    pub skip_encode: bool,

    /// Only encode images that have no embedding file yet
    #[arg(long = "skip_existing", conflicts_with = "skip_encode")]
    pub skip_existing: bool,

    /// Write the JSON report to a file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Evaluation report with the model and split it was computed for.
#[derive(Debug, Serialize)]
struct RunReport {
    backbone: String,
    datasource: String,
    split: Split,
    #[serde(flatten)]
    evaluation: EvaluationReport,
}

/// Execute the default command.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    let (backbone, datasource) = args.model.resolve(&config);

    // Fail on an unknown pair before touching the dataset or model files.
    registry::lookup(&backbone, &datasource)?;

    tokio::task::spawn_blocking(move || run_blocking(&args, &config, &backbone, &datasource))
        .await?
}

fn run_blocking(
    args: &RunArgs,
    config: &Config,
    backbone: &str,
    datasource: &str,
) -> anyhow::Result<()> {
    let root = fairface::dataset_root(args.data.fairface_path.as_deref(), config)?;
    let split = args.data.split(config);
    let labels = args.data.labels(config);

    let encoder = ClipEncoder::new(backbone, datasource, config)?;
    let store = EmbeddingStore::new(&root, split, backbone, datasource);

    if args.skip_encode {
        tracing::info!("Skipping encoding, using embeddings in {:?}", store.dir());
    } else {
        let images = fairface::get_img_list(&root, split)?;
        let start = Instant::now();
        let pb = create_progress_bar(images.len() as u64);
        let stats = encoder.batch_encode_imgs(&images, &store, args.skip_existing, |path| {
            pb.set_message(fairclip_core::store::image_name(path));
            pb.inc(1);
        })?;
        pb.finish_with_message("done");
        tracing::info!(
            "Encoding finished in {:.1}s ({} encoded, {} skipped)",
            start.elapsed().as_secs_f64(),
            stats.encoded,
            stats.skipped
        );
    }

    let rows = fairface::load_manifest(&root, split)?;
    let classifier = Classifier::new(&encoder, labels, config.classify.logit_scale)?;
    let evaluation = classifier::evaluate(&classifier, &rows, &root, &store)?;

    tracing::info!(
        "{} on {}: accuracy {:.4}, race gap {:.4}",
        labels,
        split,
        evaluation.accuracy,
        evaluation.race_gap
    );

    let report = RunReport {
        backbone: backbone.to_string(),
        datasource: datasource.to_string(),
        split,
        evaluation,
    };
    write_json(&report, args.output.as_deref())
}

/// Write a value as pretty JSON to a file or stdout.
pub(crate) fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
            writer.flush()?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

/// Create a progress bar for batch encoding.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_json(&serde_json::json!({"race_gap": 0.0833}), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["race_gap"], 0.0833);
    }
}

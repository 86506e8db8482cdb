//! The `fairclip models` command for managing CLIP checkpoints.

use clap::{Args, Subcommand};
use fairclip_core::embedding::{ImageEncoder, VISION_MODEL_FILENAME};
use fairclip_core::encoder::checkpoint_dir;
use fairclip_core::registry::{self, Pretrained};
use fairclip_core::text::{TextEncoder, TEXT_MODEL_FILENAME, TOKENIZER_FILENAME};
use fairclip_core::Config;
use std::path::Path;

use super::types::ModelArgs;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download a checkpoint's vision tower, text tower and tokenizer
    Download(ModelArgs),

    /// List known checkpoints and whether they are installed
    List,

    /// Show model directory path
    Path,
}

/// Remote file → local file for one checkpoint.
const CHECKPOINT_FILES: &[(&str, &str)] = &[
    ("onnx/vision_model.onnx", VISION_MODEL_FILENAME),
    ("onnx/text_model.onnx", TEXT_MODEL_FILENAME),
    ("tokenizer.json", TOKENIZER_FILENAME),
];

/// Whether every file of a checkpoint is present.
pub fn is_installed(config: &Config, pretrained: &Pretrained) -> bool {
    let dir = checkpoint_dir(&config.model_dir(), pretrained);
    ImageEncoder::model_exists(&dir) && TextEncoder::model_exists(&dir)
}

/// Download a checkpoint's files. Skips files already on disk.
pub async fn download_checkpoint(
    pretrained: &Pretrained,
    config: &Config,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    let dir = checkpoint_dir(&config.model_dir(), pretrained);
    std::fs::create_dir_all(&dir)?;

    for (remote, local) in CHECKPOINT_FILES {
        let dest = dir.join(local);
        if dest.exists() {
            tracing::info!("{} already exists at {:?}", local, dest);
            continue;
        }

        let url = huggingface_url(pretrained.repo, remote);
        tracing::info!("Downloading {} for {}...", local, pretrained.pair());
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(client, &url, &dest).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            local,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

fn huggingface_url(repo: &str, remote: &str) -> String {
    format!("https://huggingface.co/{repo}/resolve/main/{remote}")
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download(model) => {
            let (backbone, datasource) = model.resolve(&config);
            let pretrained = registry::lookup(&backbone, &datasource)?;

            let client = reqwest::Client::new();
            download_checkpoint(pretrained, &config, &client).await?;

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();
            println!("Pretrained checkpoints:");
            println!("  Directory: {}\n", model_dir.display());

            for pretrained in registry::list_pretrained() {
                let status = if is_installed(&config, pretrained) {
                    "ready"
                } else {
                    "not installed"
                };
                let default_marker = if pretrained.backbone == config.model.backbone
                    && pretrained.datasource == config.model.datasource
                {
                    "  (default)"
                } else {
                    ""
                };
                println!(
                    "    - {:14} {:20} {:14}{}",
                    pretrained.backbone, pretrained.datasource, status, default_marker
                );
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// Data lands in a `.part` file that is renamed once complete, so an
/// interrupted download never looks installed.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let partial = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    drop(file);

    if let Some(total) = total_size {
        if downloaded != total {
            let _ = tokio::fs::remove_file(&partial).await;
            anyhow::bail!(
                "Incomplete download of {url}: got {downloaded} of {total} bytes. Try again."
            );
        }
    }

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huggingface_url_layout() {
        assert_eq!(
            huggingface_url("Xenova/clip-vit-base-patch32", "onnx/text_model.onnx"),
            "https://huggingface.co/Xenova/clip-vit-base-patch32/resolve/main/onnx/text_model.onnx"
        );
    }

    #[test]
    fn checkpoint_not_installed_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().to_path_buf();

        let pretrained = registry::lookup("ViT-B-32", "openai").unwrap();
        assert!(!is_installed(&config, pretrained));

        let ckpt = checkpoint_dir(dir.path(), pretrained);
        std::fs::create_dir_all(&ckpt).unwrap();
        for (_, local) in CHECKPOINT_FILES {
            std::fs::write(ckpt.join(local), b"stub").unwrap();
        }
        assert!(is_installed(&config, pretrained));
    }
}

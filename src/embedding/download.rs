// Fetches the local sentence embedding model from HuggingFace.
//
// all-MiniLM-L6-v2 is stored under the platform data directory
// (~/.local/share/chunkscope/models/ on Linux) so it persists across runs.
// Files are streamed to a `.part` file and renamed once complete, so an
// interrupted download is never mistaken for a finished one.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const MODEL_NAME: &str = "all-MiniLM-L6-v2";
const MODEL_REPO_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// A file in the model repo and the flat name it is stored under.
struct ModelFile {
    remote: &'static str,
    local: &'static str,
}

const MODEL_FILES: [ModelFile; 2] = [
    ModelFile {
        remote: "tokenizer.json",
        local: "tokenizer.json",
    },
    ModelFile {
        remote: "onnx/model.onnx",
        local: "model.onnx",
    },
];

pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chunkscope")
        .join("models")
}

/// Directory under `base` holding the embedding model files.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(MODEL_NAME)
}

pub fn embedding_files_present(base: &Path) -> bool {
    let dir = embedding_model_dir(base);
    MODEL_FILES.iter().all(|f| dir.join(f.local).exists())
}

/// Download every model file that is not already present under `base`.
pub async fn download_embedding_model(base: &Path) -> Result<()> {
    let dir = embedding_model_dir(base);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory {}", dir.display()))?;

    println!("\n{MODEL_NAME}:");
    for file in &MODEL_FILES {
        let dest = dir.join(file.local);
        if dest.exists() {
            info!(file = file.local, "Model file present, skipping");
            println!("  {} (already exists)", file.local);
            continue;
        }
        println!("  Downloading {}...", file.local);
        fetch(&format!("{MODEL_REPO_URL}/{}", file.remote), &dest).await?;
    }

    Ok(())
}

async fn fetch(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to download {url}"))?;
    if !response.status().is_success() {
        anyhow::bail!("Download of {url} failed with status {}", response.status());
    }

    let pb = match response.content_length() {
        Some(len) => ProgressBar::new(len).with_style(
            ProgressStyle::default_bar()
                .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .expect("valid template")
                .progress_chars("=> "),
        ),
        None => ProgressBar::new_spinner().with_style(
            ProgressStyle::default_spinner()
                .template("    {spinner} {bytes}")
                .expect("valid template"),
        ),
    };

    let partial = dest.with_extension("part");
    let mut out = std::fs::File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Download of {url} interrupted"))?
    {
        out.write_all(&chunk)
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        pb.inc(chunk.len() as u64);
    }
    out.flush()?;
    pb.finish_and_clear();

    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;
    info!(url, dest = %dest.display(), "Downloaded model file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_dir_is_under_chunkscope() {
        let dir = default_model_dir();
        assert!(dir.ends_with("chunkscope/models"), "got {}", dir.display());
    }

    #[test]
    fn test_model_files_are_stored_flat() {
        let dir = embedding_model_dir(Path::new("/tmp/models"));
        assert_eq!(dir, PathBuf::from("/tmp/models/all-MiniLM-L6-v2"));
        assert!(MODEL_FILES.iter().all(|f| !f.local.contains('/')));
    }

    #[test]
    fn test_files_present_needs_every_file() {
        let base = std::env::temp_dir().join(format!("chunkscope-model-{}", std::process::id()));
        let dir = embedding_model_dir(&base);
        std::fs::create_dir_all(&dir).unwrap();
        assert!(!embedding_files_present(&base));

        std::fs::write(dir.join("tokenizer.json"), b"{}").unwrap();
        assert!(!embedding_files_present(&base));

        std::fs::write(dir.join("model.onnx"), b"fake").unwrap();
        assert!(embedding_files_present(&base));

        std::fs::remove_dir_all(&base).unwrap();
    }
}

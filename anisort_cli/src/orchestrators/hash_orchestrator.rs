//! The `hash` command

use crate::progress::{ProgressRenderer, format_bytes, progress_channel, render_progress};
use anisort_core::{ContentHasher, HashOutput, ProgressProvider, SharedProvider, Shutdown};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One line per file: hash, size in bytes, path
pub fn format_line(output: &HashOutput, path: &Path, link: bool) -> String {
    if link {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("ed2k://|file|{name}|{}|{}|/", output.size, output.hash)
    } else {
        format!("{}  {}  {}", output.hash, output.size, path.display())
    }
}

pub async fn hash_files(files: &[PathBuf], link: bool, show_progress: bool) -> Result<()> {
    let shutdown = Shutdown::new();
    let interrupt = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.trigger();
            }
        })
    };

    let (provider, rx) = progress_channel(64);
    let provider = Arc::new(provider);
    let render_task = tokio::spawn(render_progress(rx, ProgressRenderer::new(show_progress)));
    let hasher = ContentHasher::new(SharedProvider::new(provider.clone()), shutdown);

    let mut outcome = Ok(());
    let mut hashed = Vec::with_capacity(files.len());
    for path in files {
        if !path.is_file() {
            outcome = Err(anyhow::anyhow!("Not a file: {}", path.display()));
            break;
        }
        match hasher.hash_file(path).await {
            Ok(output) => {
                log::debug!("{} is {}", path.display(), format_bytes(output.size));
                hashed.push((path, output));
            }
            Err(e) => {
                outcome = Err(e).with_context(|| format!("Failed to hash {}", path.display()));
                break;
            }
        }
    }

    interrupt.abort();
    drop(hasher);
    provider.complete();
    let _ = render_task.await;

    for (path, output) in &hashed {
        println!("{}", format_line(output, path, link));
    }
    outcome?;
    if hashed.is_empty() {
        bail!("No files given");
    }
    Ok(())
}

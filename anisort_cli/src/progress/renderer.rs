//! indicatif rendering of progress updates

use super::format::format_duration;
use anisort_core::ProgressUpdate;
use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;

const HASH_TEMPLATE: &str =
    "{msg:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} ETA {eta}";
const OVERALL_TEMPLATE: &str = "{prefix:.bold} [{elapsed_precise}] {pos}/{len} files";

/// Drain `rx` until every sender is gone, then clear the bars
pub async fn render_progress(mut rx: mpsc::Receiver<ProgressUpdate>, renderer: ProgressRenderer) {
    let mut renderer = renderer;
    while let Some(update) = rx.recv().await {
        renderer.handle_update(update);
    }
    renderer.finish();
}

pub struct ProgressRenderer {
    multi: MultiProgress,
    hash_bars: HashMap<PathBuf, ProgressBar>,
    overall: Option<ProgressBar>,
    started: Instant,
}

impl ProgressRenderer {
    pub fn new(show_bars: bool) -> Self {
        let target = if show_bars {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            hash_bars: HashMap::new(),
            overall: None,
            started: Instant::now(),
        }
    }

    /// Show an overall counter for a run over `total` files
    pub fn with_total(mut self, total: u64) -> Self {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(OVERALL_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix("Sorting");
        self.overall = Some(bar);
        self
    }

    pub fn handle_update(&mut self, update: ProgressUpdate) {
        match update {
            ProgressUpdate::HashProgress {
                path,
                bytes_processed,
                total_bytes,
            } => self.hash_progress(path, bytes_processed, total_bytes),
            ProgressUpdate::FileFinished { path, outcome } => self.file_finished(&path, &outcome),
            ProgressUpdate::Status { message } => self.println(message.dimmed().to_string()),
        }
    }

    fn hash_progress(&mut self, path: PathBuf, bytes_processed: u64, total_bytes: u64) {
        let multi = &self.multi;
        let bar = self.hash_bars.entry(path).or_insert_with_key(|path| {
            let bar = multi.add(ProgressBar::new(total_bytes));
            bar.set_style(
                ProgressStyle::with_template(HASH_TEMPLATE)
                    .map(|style| style.progress_chars("#>-"))
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.set_message(file_name(path));
            bar
        });
        bar.set_position(bytes_processed);
        if bytes_processed >= total_bytes {
            bar.finish_and_clear();
        }
    }

    fn file_finished(&mut self, path: &Path, outcome: &str) {
        if let Some(bar) = self.hash_bars.remove(path) {
            bar.finish_and_clear();
        }
        if let Some(overall) = &self.overall {
            overall.inc(1);
        }

        let outcome = if outcome.contains(':') {
            outcome.yellow()
        } else {
            outcome.green()
        };
        self.println(format!("{} {}", outcome, path.display()));
    }

    fn println(&self, line: String) {
        if self.multi.is_hidden() {
            eprintln!("{line}");
        } else {
            let _ = self.multi.println(line);
        }
    }

    pub fn finish(self) {
        for bar in self.hash_bars.values() {
            bar.finish_and_clear();
        }
        if let Some(overall) = &self.overall {
            overall.finish_and_clear();
        }
        log::debug!("Progress rendering done after {}", format_duration(self.started.elapsed()));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

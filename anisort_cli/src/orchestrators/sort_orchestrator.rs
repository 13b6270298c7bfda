//! The `sort` command: discover, identify, rename

use crate::config::AppConfig;
use crate::discovery::{DiscoveryOptions, discover};
use crate::path_builder::TemplatePathBuilder;
use crate::prober::FfprobeProber;
use crate::progress::{ProgressRenderer, format_duration, progress_channel, render_progress};
use anisort_core::persistence::SqliteRepository;
use anisort_core::{
    MemoryRepository, Pipeline, PipelineConfig, PipelineContext, PipelineReport, ProtocolClient,
    Repository, SharedProvider, Shutdown, TransferMode,
};
use anyhow::{Context, Result, bail};
use colored::*;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    pub paths: Vec<PathBuf>,
    pub recursive: bool,
    pub copy: bool,
    pub dry_run: bool,
    /// Overrides the configured destination root
    pub destination: Option<PathBuf>,
    pub exclude_patterns: Vec<String>,
    pub show_progress: bool,
}

/// Apply command line flags on top of the loaded pipeline configuration
pub fn effective_pipeline_config(config: &AppConfig, options: &SortOptions) -> PipelineConfig {
    let mut pipeline = config.pipeline.clone();
    if options.copy {
        pipeline.transfer_mode = TransferMode::Copy;
    }
    if options.dry_run {
        pipeline.debug = true;
    }
    if let Some(destination) = &options.destination {
        pipeline.destination_root = destination.clone();
    }
    pipeline
}

pub struct SortOrchestrator {
    config: AppConfig,
    options: SortOptions,
}

impl SortOrchestrator {
    pub fn new(config: AppConfig, options: SortOptions) -> Self {
        Self { config, options }
    }

    /// Run the whole command. Fatal pipeline errors come back as `Err`.
    pub async fn run(self) -> Result<()> {
        let started = Instant::now();
        let discovery = DiscoveryOptions::new()
            .with_recursive(self.options.recursive)
            .with_exclude_patterns(self.options.exclude_patterns.clone());
        let files = discover(&self.options.paths, &discovery).context("File discovery failed")?;

        if files.is_empty() {
            eprintln!("{}", "No media files found.".yellow());
            return Ok(());
        }
        eprintln!("Found {} media file(s)", files.len());

        let credentials = &self.config.anidb.credentials;
        if !credentials.is_complete() {
            bail!(
                "AniDB credentials are not configured; set anidb.username and anidb.password in the \
                 config file or ANISORT_ANIDB__USERNAME / ANISORT_ANIDB__PASSWORD"
            );
        }

        let pipeline_config = effective_pipeline_config(&self.config, &self.options);
        if pipeline_config.debug {
            eprintln!("{}", "Dry run: nothing will be moved or recorded".bold().yellow());
        }

        let repository = self.open_repository().await?;
        let path_builder = TemplatePathBuilder::new(
            &self.config.library.template,
            self.config.library.max_path_length,
        )
        .context("Invalid rename template")?;

        let client = Arc::new(ProtocolClient::new(self.config.anidb.protocol.clone()));
        client.connect().await.context("Failed to connect to AniDB")?;
        let auth = client.login(credentials).await.context("AniDB login failed")?;
        if !auth.success {
            bail!("AniDB login rejected: {} {}", auth.code, auth.message);
        }

        let shutdown = Shutdown::new();
        let interrupt = spawn_interrupt_handler(shutdown.clone());

        let (provider, rx) = progress_channel(256);
        let renderer = ProgressRenderer::new(self.options.show_progress).with_total(files.len() as u64);
        let render_task = tokio::spawn(render_progress(rx, renderer));

        let context = PipelineContext::new(
            repository,
            client.clone(),
            Arc::new(path_builder),
            Arc::new(FfprobeProber::default()),
            pipeline_config,
        )
        .with_progress(SharedProvider::new(Arc::new(provider)))
        .with_shutdown(shutdown.clone());

        let outcome = Pipeline::new(context).run(files).await;

        interrupt.abort();
        if let Err(e) = render_task.await {
            warn!("Progress renderer stopped abnormally: {e}");
        }
        client.close().await;

        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{} {e}", "Aborted:".red().bold());
                return Err(e).context("Sort aborted");
            }
        };

        print_summary(&report, started);
        if shutdown.is_triggered() {
            bail!("Interrupted");
        }
        Ok(())
    }

    async fn open_repository(&self) -> Result<Arc<dyn Repository>> {
        match &self.config.library.database {
            Some(path) if !path.as_os_str().is_empty() => {
                debug!("Opening database at {}", path.display());
                let repository = SqliteRepository::open(path)
                    .await
                    .with_context(|| format!("Failed to open database {}", path.display()))?;
                Ok(Arc::new(repository))
            }
            _ => {
                info!("No database configured, file history is kept in memory");
                Ok(Arc::new(MemoryRepository::new()))
            }
        }
    }
}

/// First Ctrl-C stops new work and lets in-flight requests finish; a second one exits
fn spawn_interrupt_handler(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!(
            "{}",
            "Stopping after the current files, press Ctrl-C again to quit now".yellow()
        );
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    })
}

/// Completed items counted by final status, dropped items by stage
pub fn summarize(report: &PipelineReport) -> (BTreeMap<String, usize>, BTreeMap<&'static str, usize>) {
    let mut statuses = BTreeMap::new();
    for item in &report.completed {
        let status = item
            .local_file()
            .map(|file| file.status.to_string())
            .unwrap_or_else(|| "completed".to_string());
        *statuses.entry(status).or_default() += 1;
    }

    let mut drops = BTreeMap::new();
    for record in &report.dropped {
        *drops.entry(record.stage).or_default() += 1;
    }
    (statuses, drops)
}

fn print_summary(report: &PipelineReport, started: Instant) {
    let (statuses, drops) = summarize(report);

    eprintln!();
    eprintln!(
        "{} {} file(s) in {}",
        "Processed".bold(),
        report.total(),
        format_duration(started.elapsed())
    );
    for (status, count) in &statuses {
        eprintln!("  {:<24} {}", status.green(), count);
    }
    for (stage, count) in &drops {
        eprintln!("  {:<24} {}", format!("dropped in {stage}").yellow(), count);
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        eprintln!("{}", "Failures:".red().bold());
        for record in failures {
            eprintln!("  [{}] {}: {}", record.stage, record.path.display(), record.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anisort_core::pipeline::{DropReason, DropRecord};
    use anisort_core::{FileStatus, LocalFile};
    use anisort_core::pipeline::WorkItem;

    #[test]
    fn test_flags_override_configuration() {
        let config = AppConfig::default();
        let options = SortOptions {
            copy: true,
            dry_run: true,
            destination: Some(PathBuf::from("/library")),
            ..Default::default()
        };

        let pipeline = effective_pipeline_config(&config, &options);
        assert_eq!(pipeline.transfer_mode, TransferMode::Copy);
        assert!(pipeline.debug);
        assert_eq!(pipeline.destination_root, PathBuf::from("/library"));
    }

    #[test]
    fn test_no_flags_keep_configuration() {
        let config = AppConfig::default();
        let pipeline = effective_pipeline_config(&config, &SortOptions::default());
        assert_eq!(pipeline, config.pipeline);
    }

    #[test]
    fn test_summary_groups_outcomes() {
        let mut imported = LocalFile::new(1, "/library/a.mkv");
        imported.status = FileStatus::Imported;
        let report = PipelineReport {
            completed: vec![WorkItem::Tracked(imported)],
            dropped: vec![
                DropRecord {
                    stage: "filter",
                    path: PathBuf::from("/b.mkv"),
                    reason: DropReason::AlreadyImported,
                },
                DropRecord {
                    stage: "filter",
                    path: PathBuf::from("/c.mkv"),
                    reason: DropReason::RetryCapReached { attempts: 5 },
                },
                DropRecord {
                    stage: "search",
                    path: PathBuf::from("/d.mkv"),
                    reason: DropReason::NotFound,
                },
            ],
        };

        let (statuses, drops) = summarize(&report);
        assert_eq!(statuses.get("imported"), Some(&1));
        assert_eq!(drops.get("filter"), Some(&2));
        assert_eq!(drops.get("search"), Some(&1));
    }
}

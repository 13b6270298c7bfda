//! Wires stages together with bounded queues and drives them to completion

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::item::WorkItem;
use super::stage::{DropReason, Stage, StageOutcome};
use super::stages::{FetchStage, HashStage, ProbeStage, RenameStage, RetryFilterStage, SearchStage};
use crate::error::{InternalError, ValidationError};
use crate::progress::{ProgressProvider, ProgressUpdate};
use crate::{Error, Result};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

/// One stage and how many workers run it
#[derive(Clone)]
pub struct StageDescriptor {
    pub stage: Arc<dyn Stage>,
    pub workers: usize,
}

impl StageDescriptor {
    pub fn new(stage: impl Stage + 'static, workers: usize) -> Self {
        Self {
            stage: Arc::new(stage),
            workers,
        }
    }
}

/// fetch, filter, hash, search, probe, rename
pub fn standard_stages(config: &PipelineConfig) -> Vec<StageDescriptor> {
    let workers = &config.workers;
    vec![
        StageDescriptor::new(FetchStage, workers.fetch),
        StageDescriptor::new(RetryFilterStage, workers.filter),
        StageDescriptor::new(HashStage, workers.hash),
        StageDescriptor::new(SearchStage, workers.search),
        StageDescriptor::new(ProbeStage, workers.probe),
        StageDescriptor::new(RenameStage, workers.rename),
    ]
}

/// An item that left the pipeline early
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRecord {
    pub stage: &'static str,
    pub path: PathBuf,
    pub reason: DropReason,
}

/// What happened to every item of a run
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Items that made it out of the last stage
    pub completed: Vec<WorkItem>,
    pub dropped: Vec<DropRecord>,
}

impl PipelineReport {
    pub fn total(&self) -> usize {
        self.completed.len() + self.dropped.len()
    }

    pub fn dropped_in(&self, stage: &str) -> impl Iterator<Item = &DropRecord> {
        self.dropped.iter().filter(move |record| record.stage == stage)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DropRecord> {
        self.dropped.iter().filter(|record| record.reason.is_failure())
    }
}

/// A sequence of stages connected by bounded queues
pub struct Pipeline {
    context: Arc<PipelineContext>,
    stages: Vec<StageDescriptor>,
}

impl Pipeline {
    /// Pipeline with the standard stages
    pub fn new(context: PipelineContext) -> Self {
        let stages = standard_stages(context.config());
        Self::with_stages(context, stages)
    }

    pub fn with_stages(context: PipelineContext, stages: Vec<StageDescriptor>) -> Self {
        Self {
            context: Arc::new(context),
            stages,
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Push every path through the stages.
    ///
    /// Returns `Err` with the first fatal error after all workers have stopped.
    pub async fn run<I>(&self, paths: I) -> Result<PipelineReport>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        if self.stages.is_empty() {
            return Err(ValidationError::invalid_configuration("pipeline has no stages").into());
        }

        let capacity = self.context.config().queue_capacity.max(1);
        let shared = Arc::new(Shared {
            report: Mutex::new(PipelineReport::default()),
            fatal: Mutex::new(None),
        });
        let mut tasks = JoinSet::new();

        let (source, mut upstream) = mpsc::channel(capacity);
        let paths: Vec<PathBuf> = paths.into_iter().collect();
        debug!("Starting pipeline with {} paths", paths.len());
        tasks.spawn(feed(paths, source, self.context.clone()));

        let last = self.stages.len() - 1;
        for (index, descriptor) in self.stages.iter().enumerate() {
            let input = Arc::new(Mutex::new(upstream));
            let (output, next) = if index == last {
                let (_, closed) = mpsc::channel(1);
                (None, closed)
            } else {
                let (sender, receiver) = mpsc::channel(capacity);
                (Some(sender), receiver)
            };

            for _ in 0..descriptor.workers.max(1) {
                let worker = Worker {
                    stage: descriptor.stage.clone(),
                    context: self.context.clone(),
                    input: input.clone(),
                    output: output.clone(),
                    shared: shared.clone(),
                };
                tasks.spawn(worker.run());
            }
            upstream = next;
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Pipeline worker failed: {e}");
                shared
                    .fail(InternalError::worker(format!("worker task failed: {e}")).into())
                    .await;
                self.context.shutdown().trigger();
            }
        }

        self.context.progress().complete();

        if let Some(error) = shared.fatal.lock().await.take() {
            return Err(error);
        }

        let report = std::mem::take(&mut *shared.report.lock().await);
        info!(
            "Pipeline finished: {} completed, {} dropped",
            report.completed.len(),
            report.dropped.len()
        );
        Ok(report)
    }
}

struct Shared {
    report: Mutex<PipelineReport>,
    fatal: Mutex<Option<Error>>,
}

impl Shared {
    /// Keep the first fatal error
    async fn fail(&self, error: Error) {
        let mut fatal = self.fatal.lock().await;
        if fatal.is_none() {
            *fatal = Some(error);
        }
    }
}

async fn feed(paths: Vec<PathBuf>, source: mpsc::Sender<WorkItem>, context: Arc<PipelineContext>) {
    let shutdown = context.shutdown();
    for path in paths {
        if shutdown.is_triggered() {
            break;
        }
        tokio::select! {
            sent = source.send(WorkItem::Discovered(path)) => {
                if sent.is_err() {
                    break;
                }
            }
            _ = shutdown.triggered() => break,
        }
    }
    if shutdown.is_triggered() {
        debug!("Shutdown requested, no more files enter the pipeline");
    }
}

struct Worker {
    stage: Arc<dyn Stage>,
    context: Arc<PipelineContext>,
    input: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    output: Option<mpsc::Sender<WorkItem>>,
    shared: Arc<Shared>,
}

impl Worker {
    async fn run(self) {
        loop {
            let next = self.input.lock().await.recv().await;
            let Some(item) = next else {
                break;
            };
            let path = item.path().to_path_buf();

            let outcome = if self.context.shutdown().is_triggered() {
                StageOutcome::Drop(DropReason::Cancelled)
            } else {
                self.stage.process(item, &self.context).await
            };

            match outcome {
                StageOutcome::Continue(item) => self.forward(item, path).await,
                StageOutcome::Drop(reason) => self.dropped(path, reason).await,
                StageOutcome::Fatal(error) => {
                    error!(
                        "[{}] fatal error on {}: {error}",
                        self.stage.name(),
                        path.display()
                    );
                    self.shared.fail(error).await;
                    self.context.shutdown().trigger();
                }
            }
        }
    }

    async fn forward(&self, item: WorkItem, path: PathBuf) {
        match &self.output {
            Some(output) => {
                if output.send(item).await.is_err() {
                    self.dropped(path, DropReason::Cancelled).await;
                }
            }
            None => {
                let outcome = item
                    .local_file()
                    .map(|file| file.status.to_string())
                    .unwrap_or_else(|| "completed".to_string());
                debug!("[{}] finished {}: {outcome}", self.stage.name(), path.display());
                self.context
                    .progress()
                    .report(ProgressUpdate::FileFinished { path, outcome });
                self.shared.report.lock().await.completed.push(item);
            }
        }
    }

    async fn dropped(&self, path: PathBuf, reason: DropReason) {
        let stage = self.stage.name();
        if reason.is_failure() {
            warn!("[{stage}] dropped {}: {reason}", path.display());
        } else {
            info!("[{stage}] dropped {}: {reason}", path.display());
        }

        self.context.progress().report(ProgressUpdate::FileFinished {
            path: path.clone(),
            outcome: format!("{stage}: {reason}"),
        });
        self.shared
            .report
            .lock()
            .await
            .dropped
            .push(DropRecord {
                stage,
                path,
                reason,
            });
    }
}

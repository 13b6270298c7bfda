use crate::Error;
use crate::hashing::ContentHasher;
use crate::persistence::{FileActionKind, FileStatus, LocalFile, NewFileAction};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::item::WorkItem;
use crate::pipeline::stage::{Stage, StageOutcome, unexpected};
use async_trait::async_trait;
use log::{debug, warn};

/// Computes and stores the content hash of files that do not have one yet
pub struct HashStage;

#[async_trait]
impl Stage for HashStage {
    fn name(&self) -> &'static str {
        "hash"
    }

    async fn process(&self, item: WorkItem, context: &PipelineContext) -> StageOutcome {
        let mut file = match item {
            WorkItem::Tracked(file) => file,
            other => return unexpected(self.name(), &other),
        };

        if file.is_hashed() {
            debug!("{} already hashed", file.path.display());
            return StageOutcome::Continue(WorkItem::Tracked(file));
        }

        let hasher = ContentHasher::new(context.progress().clone(), context.shutdown().clone());
        let output = match hasher.hash_file(&file.path).await {
            Ok(output) => output,
            Err(Error::Cancelled) => return StageOutcome::from_error(Error::Cancelled),
            Err(e) => {
                warn!("Failed to hash {}: {e}", file.path.display());
                record_failure(context, file, &e).await;
                return StageOutcome::from_error(e);
            }
        };

        debug!(
            "Hashed {} ({} bytes): {}",
            file.path.display(),
            output.size,
            output.hash
        );
        file.hash = Some(output.hash);
        file.size = Some(output.size);
        if let Err(e) = file.set_status(FileStatus::Hashed) {
            return StageOutcome::from_error(e.into());
        }

        let action = NewFileAction::succeeded(file.id, FileActionKind::Hash)
            .with_info(format!("{} {}", output.size, output.hash));
        match context.commit(&file, action).await {
            Ok(file) => StageOutcome::Continue(WorkItem::Tracked(file)),
            Err(e) => StageOutcome::from_error(e),
        }
    }
}

async fn record_failure(context: &PipelineContext, mut file: LocalFile, error: &Error) {
    let action = NewFileAction::failed(file.id, FileActionKind::Hash, error.to_string());
    let result = match file.set_status(FileStatus::Error) {
        Ok(()) => context.commit(&file, action).await.map(drop),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        warn!(
            "Could not record hash failure for {}: {e}",
            file.path.display()
        );
    }
}

use crate::Error;
use crate::error::IoError;
use crate::persistence::{FileActionKind, FileStatus, LocalFile, NewFileAction};
use crate::pipeline::config::TransferMode;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::item::{IdentificationResult, WorkItem};
use crate::pipeline::stage::{Stage, StageOutcome, unexpected};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::Path;

/// Moves or copies an identified file to its destination
pub struct RenameStage;

#[async_trait]
impl Stage for RenameStage {
    fn name(&self) -> &'static str {
        "rename"
    }

    async fn process(&self, item: WorkItem, context: &PipelineContext) -> StageOutcome {
        let result = match item {
            WorkItem::Identified(result) => result,
            other => return unexpected(self.name(), &other),
        };

        let mode = context.config().transfer_mode;
        let kind = match mode {
            TransferMode::Move => FileActionKind::Move,
            TransferMode::Copy => FileActionKind::Copy,
        };

        let destination = match context.path_builder().build(&result) {
            Ok(path) => context.config().destination_root.join(path),
            Err(e) => return fail(context, result.file, kind, e).await,
        };
        let status = if result.is_missing_data() {
            FileStatus::ImportedMissingData
        } else {
            FileStatus::Imported
        };

        match tokio::fs::try_exists(&destination).await {
            Ok(true) => return deduplicated(context, *result, &destination, status).await,
            Ok(false) => {}
            Err(e) => {
                let error = IoError::from_std(e).with_path(&destination).into();
                return fail(context, result.file, kind, error).await;
            }
        }

        let mut result = *result;
        let source = result.file.path.clone();

        if context.is_debug() {
            info!(
                "Debug mode: would {kind} {} to {}",
                source.display(),
                destination.display()
            );
            return finish(context, result, status, None).await;
        }

        if let Err(e) = transfer(&source, &destination, mode).await {
            return fail(context, result.file, kind, e.into()).await;
        }

        info!("{kind} {} -> {}", source.display(), destination.display());
        if mode == TransferMode::Move {
            result.file.path = destination.clone();
        }
        let action = NewFileAction::succeeded(result.file.id, kind).with_info(format!(
            "{} -> {}",
            source.display(),
            destination.display()
        ));
        finish(context, result, status, Some(action)).await
    }
}

/// The destination already exists, so the file counts as imported without being touched
async fn deduplicated(
    context: &PipelineContext,
    result: IdentificationResult,
    destination: &Path,
    status: FileStatus,
) -> StageOutcome {
    debug!(
        "{} already exists, not touching {}",
        destination.display(),
        result.file.path.display()
    );
    let action = NewFileAction::succeeded(result.file.id, FileActionKind::Copied).with_info(
        format!("destination already exists: {}", destination.display()),
    );
    finish(context, result, status, Some(action)).await
}

async fn finish(
    context: &PipelineContext,
    mut result: IdentificationResult,
    status: FileStatus,
    action: Option<NewFileAction>,
) -> StageOutcome {
    if let Err(e) = result.file.set_status(status) {
        return StageOutcome::from_error(e.into());
    }

    let stored = match action {
        Some(action) => context.commit(&result.file, action).await,
        None => Ok(result.file.clone()),
    };
    match stored {
        Ok(file) => {
            result.file = file;
            StageOutcome::Continue(WorkItem::Identified(Box::new(result)))
        }
        Err(e) => StageOutcome::from_error(e),
    }
}

/// Mark the file `Error`, record what went wrong and drop it
async fn fail(
    context: &PipelineContext,
    mut file: LocalFile,
    kind: FileActionKind,
    error: Error,
) -> StageOutcome {
    warn!("Failed to {kind} {}: {error}", file.path.display());

    let action = NewFileAction::failed(file.id, kind, error.to_string());
    let recorded = match file.set_status(FileStatus::Error) {
        Ok(()) => context.commit(&file, action).await.map(drop),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = recorded {
        warn!("Could not record {kind} failure for {}: {e}", file.path.display());
    }

    StageOutcome::from_error(error)
}

/// Move or copy `source` to `destination`, creating parent directories.
///
/// A move across filesystems falls back to copy and remove.
pub async fn transfer(source: &Path, destination: &Path, mode: TransferMode) -> Result<(), IoError> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| IoError::from_std(e).with_path(parent))?;
    }

    match mode {
        TransferMode::Copy => copy(source, destination).await,
        TransferMode::Move => match tokio::fs::rename(source, destination).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                debug!(
                    "{} is on another filesystem, copying instead",
                    destination.display()
                );
                copy(source, destination).await?;
                tokio::fs::remove_file(source)
                    .await
                    .map_err(|e| IoError::from_std(e).with_path(source))
            }
            Err(e) => Err(IoError::from_std(e).with_path(source)),
        },
    }
}

async fn copy(source: &Path, destination: &Path) -> Result<(), IoError> {
    tokio::fs::copy(source, destination)
        .await
        .map(drop)
        .map_err(|e| IoError::from_std(e).with_path(source))
}

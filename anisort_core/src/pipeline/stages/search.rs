use crate::Error;
use crate::hashing::ContentHash;
use crate::persistence::{FileActionKind, FileStatus, LocalFile, NewFileAction};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::item::{IdentificationResult, WorkItem};
use crate::pipeline::stage::{DropReason, Stage, StageOutcome, unexpected};
use crate::protocol::FileSearchResult;
use async_trait::async_trait;
use log::{debug, info, warn};

/// Looks the file up on AniDB by size and content hash
pub struct SearchStage;

#[async_trait]
impl Stage for SearchStage {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn process(&self, item: WorkItem, context: &PipelineContext) -> StageOutcome {
        let mut file = match item {
            WorkItem::Tracked(file) => file,
            other => return unexpected(self.name(), &other),
        };

        let (Some(hash), Some(size)) = (file.hash, file.size) else {
            return StageOutcome::failed("file reached search without a hash");
        };

        // A previous search or rename left an outcome behind; searching again restarts from Hashed
        if file.status != FileStatus::Hashed
            && let Err(e) = file.set_status(FileStatus::Hashed)
        {
            return StageOutcome::from_error(e.into());
        }

        let config = context.config();
        let result = context
            .client()
            .search_for_file(size, &hash, config.file_mask, config.anime_mask)
            .await;

        match result {
            Ok(FileSearchResult::Found(lookup)) => found(context, file, *lookup).await,
            Ok(FileSearchResult::NotFound) => not_found(context, file, size, &hash).await,
            Err(e) => {
                warn!("Search for {} failed: {e}", file.path.display());
                let action = NewFileAction::failed(file.id, FileActionKind::Search, e.to_string());
                if let Err(record_error) = context.append_file_action(action).await {
                    warn!(
                        "Could not record search failure for {}: {record_error}",
                        file.path.display()
                    );
                }
                StageOutcome::from_error(e)
            }
        }
    }
}

async fn found(
    context: &PipelineContext,
    mut file: LocalFile,
    lookup: crate::metadata::FileLookup,
) -> StageOutcome {
    info!(
        "Identified {} as AniDB file {}",
        file.path.display(),
        lookup.file.fid
    );

    if let Err(e) = context.upsert_lookup(&lookup).await {
        return StageOutcome::from_error(e);
    }

    file.remote_file_id = Some(lookup.file.fid);
    let action = NewFileAction::succeeded(file.id, FileActionKind::Search)
        .with_info(format!("fid {}", lookup.file.fid));
    match context.commit(&file, action).await {
        Ok(file) => StageOutcome::Continue(WorkItem::Identified(Box::new(
            IdentificationResult::new(file, lookup),
        ))),
        Err(e) => StageOutcome::from_error(e),
    }
}

async fn not_found(
    context: &PipelineContext,
    mut file: LocalFile,
    size: u64,
    hash: &ContentHash,
) -> StageOutcome {
    debug!("No AniDB file for {} ({size} bytes, {hash})", file.path.display());

    if let Err(e) = file.set_status(FileStatus::NoFileFound) {
        return StageOutcome::from_error(Error::from(e));
    }
    let action = NewFileAction::failed(file.id, FileActionKind::Search, "no such file");
    match context.commit(&file, action).await {
        Ok(_) => StageOutcome::Drop(DropReason::NotFound),
        Err(e) => StageOutcome::from_error(e),
    }
}

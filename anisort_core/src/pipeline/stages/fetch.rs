use crate::pipeline::context::PipelineContext;
use crate::pipeline::item::WorkItem;
use crate::pipeline::stage::{DropReason, Stage, StageOutcome, unexpected};
use async_trait::async_trait;

/// Looks up or creates the record for a discovered path
pub struct FetchStage;

#[async_trait]
impl Stage for FetchStage {
    fn name(&self) -> &'static str {
        "fetch"
    }

    async fn process(&self, item: WorkItem, context: &PipelineContext) -> StageOutcome {
        let path = match item {
            WorkItem::Discovered(path) => path,
            other => return unexpected(self.name(), &other),
        };

        match context.get_or_create_local_file(&path).await {
            Ok(file) if file.status.is_imported() => StageOutcome::Drop(DropReason::AlreadyImported),
            Ok(file) => StageOutcome::Continue(WorkItem::Tracked(file)),
            Err(e) => StageOutcome::from_error(e),
        }
    }
}

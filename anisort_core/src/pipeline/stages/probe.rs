use crate::pipeline::context::PipelineContext;
use crate::pipeline::item::WorkItem;
use crate::pipeline::stage::{DropReason, Stage, StageOutcome, unexpected};
use async_trait::async_trait;
use log::{debug, error};

/// Fills in the resolution when AniDB did not provide one
pub struct ProbeStage;

#[async_trait]
impl Stage for ProbeStage {
    fn name(&self) -> &'static str {
        "probe"
    }

    async fn process(&self, item: WorkItem, context: &PipelineContext) -> StageOutcome {
        let mut result = match item {
            WorkItem::Identified(result) => result,
            other => return unexpected(self.name(), &other),
        };

        if result.resolution.is_some() {
            return StageOutcome::Continue(WorkItem::Identified(result));
        }

        let path = result.file.path.clone();
        match context.prober().probe(&path).await {
            Ok(Some(resolution)) => {
                debug!("Probed {} at {resolution}", path.display());
                result.resolution = Some(resolution);
                StageOutcome::Continue(WorkItem::Identified(result))
            }
            Ok(None) => {
                error!("No video stream found in {}", path.display());
                StageOutcome::Drop(DropReason::NoVideoStream)
            }
            Err(e) => {
                error!("Failed to probe {}: {e}", path.display());
                StageOutcome::from_error(e)
            }
        }
    }
}

use crate::persistence::{FileAction, FileActionKind};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::item::WorkItem;
use crate::pipeline::stage::{DropReason, Stage, StageOutcome, unexpected};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Drops files that used up their searches or were searched too recently
pub struct RetryFilterStage;

#[async_trait]
impl Stage for RetryFilterStage {
    fn name(&self) -> &'static str {
        "filter"
    }

    async fn process(&self, item: WorkItem, context: &PipelineContext) -> StageOutcome {
        let WorkItem::Tracked(file) = &item else {
            return unexpected(self.name(), &item);
        };

        let actions = match context.file_actions(file.id).await {
            Ok(actions) => actions,
            Err(e) => return StageOutcome::from_error(e),
        };

        let config = context.config();
        match retry_decision(
            &actions,
            config.max_search_retries,
            config.search_cooldown(),
            Utc::now(),
        ) {
            Some(reason) => StageOutcome::Drop(reason),
            None => StageOutcome::Continue(item),
        }
    }
}

/// Why a file must not be searched now, if it must not.
///
/// Only `Search` actions count, successful or not. `actions` must be oldest first.
pub fn retry_decision(
    actions: &[FileAction],
    max_retries: u32,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Option<DropReason> {
    let searches: Vec<&FileAction> = actions
        .iter()
        .filter(|action| action.kind == FileActionKind::Search)
        .collect();

    if searches.len() >= max_retries as usize {
        return Some(DropReason::RetryCapReached {
            attempts: searches.len(),
        });
    }

    let last = searches.last()?;
    let eligible_at = last
        .created_at
        .checked_add_signed(cooldown)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if eligible_at > now {
        let remaining = (eligible_at - now).to_std().unwrap_or_default();
        return Some(DropReason::CoolingDown { remaining });
    }

    None
}

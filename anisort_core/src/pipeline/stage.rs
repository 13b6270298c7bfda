//! Stage contract and the tagged outcome every stage returns

use super::context::PipelineContext;
use super::item::WorkItem;
use crate::Error;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Why an item left the pipeline early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    AlreadyImported,
    RetryCapReached { attempts: usize },
    CoolingDown { remaining: Duration },
    NotFound,
    NoVideoStream,
    Cancelled,
    Failed(String),
}

impl DropReason {
    /// Drops that point at a problem rather than at normal filtering
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NoVideoStream | Self::Failed(_))
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyImported => write!(f, "already imported"),
            Self::RetryCapReached { attempts } => {
                write!(f, "searched {attempts} times, giving up")
            }
            Self::CoolingDown { remaining } => {
                write!(f, "searched recently, retry in {}s", remaining.as_secs())
            }
            Self::NotFound => write!(f, "no such file on AniDB"),
            Self::NoVideoStream => write!(f, "no video stream"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed(reason) => write!(f, "{reason}"),
        }
    }
}

/// Result of running one item through one stage
#[derive(Debug)]
pub enum StageOutcome {
    Continue(WorkItem),
    Drop(DropReason),
    /// Abort the whole run
    Fatal(Error),
}

impl StageOutcome {
    /// Fatal errors abort the run, cancellation drops quietly, anything else drops the item
    pub fn from_error(error: Error) -> Self {
        match error {
            Error::Cancelled => Self::Drop(DropReason::Cancelled),
            error if error.is_fatal() => Self::Fatal(error),
            error => Self::Drop(DropReason::Failed(error.to_string())),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Drop(DropReason::Failed(reason.into()))
    }
}

/// One step of the pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(&self, item: WorkItem, context: &PipelineContext) -> StageOutcome;
}

/// Outcome for an item of a shape the stage does not accept
pub(crate) fn unexpected(stage: &str, item: &WorkItem) -> StageOutcome {
    StageOutcome::Fatal(
        crate::error::InternalError::assertion(format!(
            "{stage} stage received a {} item",
            item.kind()
        ))
        .into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionError, IoError, ProtocolError};

    #[test]
    fn test_fatal_errors_abort() {
        let outcome = StageOutcome::from_error(ProtocolError::banned("spam").into());
        assert!(matches!(outcome, StageOutcome::Fatal(_)));

        let outcome =
            StageOutcome::from_error(ConnectionError::no_reply(Duration::from_secs(30)).into());
        assert!(matches!(outcome, StageOutcome::Fatal(_)));
    }

    #[test]
    fn test_other_errors_drop() {
        let outcome = StageOutcome::from_error(ProtocolError::ServerBusy.into());
        assert!(matches!(outcome, StageOutcome::Drop(DropReason::Failed(_))));

        let outcome = StageOutcome::from_error(
            IoError::file_not_found(std::path::Path::new("/gone.mkv")).into(),
        );
        assert!(matches!(outcome, StageOutcome::Drop(DropReason::Failed(_))));

        let outcome = StageOutcome::from_error(Error::Cancelled);
        assert!(matches!(outcome, StageOutcome::Drop(DropReason::Cancelled)));
    }

    #[test]
    fn test_drop_reason_display() {
        assert_eq!(
            DropReason::CoolingDown {
                remaining: Duration::from_secs(90)
            }
            .to_string(),
            "searched recently, retry in 90s"
        );
        assert!(DropReason::Failed("x".into()).is_failure());
        assert!(!DropReason::AlreadyImported.is_failure());
    }
}

use thiserror::Error;

use crate::orchestrator::ChannelStage;
use crate::window::MAX_WINDOW_DAYS;

/// Failures surfaced by the aggregation engine and its collaborators.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("channel `{0}` not found")]
    ChannelNotFound(String),

    #[error("user `{0}` not found")]
    UserNotFound(String),

    /// A message that would count as a topic carries no author id.
    #[error("message {} has no author", .ts.as_deref().unwrap_or("<unknown ts>"))]
    MissingAuthor { ts: Option<String> },

    #[error("window of {0} days is out of range (1..={max})", max = MAX_WINDOW_DAYS)]
    InvalidWindow(u32),

    #[error("channel `{channel}` failed while {stage}")]
    Stage {
        channel: String,
        stage: ChannelStage,
        #[source]
        source: Box<DigestError>,
    },

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

pub type Result<T, E = DigestError> = std::result::Result<T, E>;

impl DigestError {
    pub fn at_stage(self, channel: &str, stage: ChannelStage) -> Self {
        DigestError::Stage {
            channel: channel.to_string(),
            stage,
            source: Box::new(self),
        }
    }

    /// The underlying failure with any stage wrappers peeled off.
    pub fn root(&self) -> &DigestError {
        match self {
            DigestError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

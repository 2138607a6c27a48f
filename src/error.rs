//! Operation-level error taxonomy.

use crate::services::event_store::StoreError;
use crate::services::solana_rpc::ChainReaderError;

/// Why a pipeline operation could not produce a payload
#[derive(Debug)]
pub enum PipelineError {
    /// A required endpoint or credential is missing. Not retried.
    Configuration(String),
    /// A chain read the operation cannot do without failed
    Upstream(ChainReaderError),
    Store(StoreError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Upstream(e) => write!(f, "Upstream unavailable: {}", e),
            PipelineError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ChainReaderError> for PipelineError {
    fn from(e: ChainReaderError) -> Self {
        PipelineError::Upstream(e)
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        PipelineError::Store(e)
    }
}

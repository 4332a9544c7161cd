use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{EndpointId, ProbeParams, ProbeReport};

/// Reasons a probe cycle produced no report at all
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot resolve host: {0}")]
    Unresolvable(String),

    #[error("failed to launch probe: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("probe did not finish within {0:?}")]
    TimedOut(std::time::Duration),

    #[error("unexpected probe output: {0}")]
    Output(String),
}

/// Port for measuring reachability of a single endpoint
#[async_trait]
pub trait Prober: Send + Sync {
    /// Send `params.packet_count` packets to `endpoint` and report the replies
    async fn probe(&self, endpoint: &EndpointId, params: &ProbeParams) -> Result<ProbeReport, ProbeError>;
}

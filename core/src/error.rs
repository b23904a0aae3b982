use std::path::PathBuf;

use thiserror::Error;

/// Failures of the identity / funding / transfer flow. Every variant is fatal.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Corrupt identity in secret store: {0}")]
    CorruptIdentity(String),
    #[error("Secret store {} is not accessible: {source}", .path.display())]
    PersistenceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Funding failed: {0}")]
    FundingFailed(String),
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
}

impl FlowError {
    /// Short label used for the failure counter.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::CorruptIdentity(_) => "corrupt_identity",
            FlowError::PersistenceError { .. } => "persistence",
            FlowError::FundingFailed(_) => "funding",
            FlowError::TransferFailed(_) => "transfer",
        }
    }

    pub fn funding(err: anyhow::Error) -> Self {
        FlowError::FundingFailed(format!("{:#}", err))
    }

    pub fn transfer(err: anyhow::Error) -> Self {
        FlowError::TransferFailed(format!("{:#}", err))
    }
}

use crate::account::AccountInfo;
use crate::ids::SourceId;
use crate::order::DonorPendingOrder;
use crate::position::DonorPosition;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DonorSourceError {
    #[error("donor source is disconnected")]
    Disconnected,
    #[error("donor source round-trip timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

/// A single snapshot of everything a donor source currently reports.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DonorSnapshot {
    pub positions: Vec<DonorPosition>,
    pub orders: Vec<DonorPendingOrder>,
    pub account_info: Option<AccountInfo>,
}

/// Shared capability set of the three donor source variants (`spec.md`
/// §4.2, §9): in-process broker gateway, and the two socket variants which
/// differ only in logging label.
#[async_trait]
pub trait DonorSource: Send + Sync {
    fn id(&self) -> &SourceId;

    async fn connect(&self) -> Result<(), DonorSourceError>;

    async fn disconnect(&self) -> Result<(), DonorSourceError>;

    async fn positions(&self) -> Result<Vec<DonorPosition>, DonorSourceError>;

    async fn orders(&self) -> Result<Vec<DonorPendingOrder>, DonorSourceError>;

    async fn account_info(&self) -> Result<AccountInfo, DonorSourceError>;

    fn is_connected(&self) -> bool;
}

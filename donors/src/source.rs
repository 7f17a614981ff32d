use async_trait::async_trait;
use trade_copier_domain::account::AccountInfo;
use trade_copier_domain::donor_source::{DonorSource, DonorSourceError};
use trade_copier_domain::ids::SourceId;
use trade_copier_domain::order::DonorPendingOrder;
use trade_copier_domain::position::DonorPosition;

use crate::in_process::InProcessDonorSource;
use crate::socket::SocketDonorSource;

/// The three donor source variants configured via `donors_config.json`
/// (`spec.md` §9). `SocketMt4` and `SocketMt5` share the identical wire
/// format and differ only by logging label; dispatch is a closed match
/// rather than a trait object so adding a variant is a compile error at
/// every call site until handled.
pub enum DonorSourceImpl {
    InProcess(InProcessDonorSource),
    SocketMt4(SocketDonorSource),
    SocketMt5(SocketDonorSource),
}

#[async_trait]
impl DonorSource for DonorSourceImpl {
    fn id(&self) -> &SourceId {
        match self {
            DonorSourceImpl::InProcess(s) => s.id(),
            DonorSourceImpl::SocketMt4(s) => s.id(),
            DonorSourceImpl::SocketMt5(s) => s.id(),
        }
    }

    async fn connect(&self) -> Result<(), DonorSourceError> {
        match self {
            DonorSourceImpl::InProcess(s) => s.connect().await,
            DonorSourceImpl::SocketMt4(s) => s.connect().await,
            DonorSourceImpl::SocketMt5(s) => s.connect().await,
        }
    }

    async fn disconnect(&self) -> Result<(), DonorSourceError> {
        match self {
            DonorSourceImpl::InProcess(s) => s.disconnect().await,
            DonorSourceImpl::SocketMt4(s) => s.disconnect().await,
            DonorSourceImpl::SocketMt5(s) => s.disconnect().await,
        }
    }

    async fn positions(&self) -> Result<Vec<DonorPosition>, DonorSourceError> {
        match self {
            DonorSourceImpl::InProcess(s) => s.positions().await,
            DonorSourceImpl::SocketMt4(s) => s.positions().await,
            DonorSourceImpl::SocketMt5(s) => s.positions().await,
        }
    }

    async fn orders(&self) -> Result<Vec<DonorPendingOrder>, DonorSourceError> {
        match self {
            DonorSourceImpl::InProcess(s) => s.orders().await,
            DonorSourceImpl::SocketMt4(s) => s.orders().await,
            DonorSourceImpl::SocketMt5(s) => s.orders().await,
        }
    }

    async fn account_info(&self) -> Result<AccountInfo, DonorSourceError> {
        match self {
            DonorSourceImpl::InProcess(s) => s.account_info().await,
            DonorSourceImpl::SocketMt4(s) => s.account_info().await,
            DonorSourceImpl::SocketMt5(s) => s.account_info().await,
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            DonorSourceImpl::InProcess(s) => s.is_connected(),
            DonorSourceImpl::SocketMt4(s) => s.is_connected(),
            DonorSourceImpl::SocketMt5(s) => s.is_connected(),
        }
    }
}

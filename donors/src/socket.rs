use crate::wire::{decode_frame, DonorFrame};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trade_copier_domain::account::AccountInfo;
use trade_copier_domain::donor_source::{DonorSnapshot, DonorSource, DonorSourceError};
use trade_copier_domain::ids::SourceId;
use trade_copier_domain::order::DonorPendingOrder;
use trade_copier_domain::position::DonorPosition;

/// Logging label only — the MT4 and MT5 socket variants share the identical
/// wire format (`spec.md` §4.2, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Mt4,
    Mt5,
}

impl SocketKind {
    fn label(self) -> &'static str {
        match self {
            SocketKind::Mt4 => "socket_mt4",
            SocketKind::Mt5 => "socket_mt5",
        }
    }
}

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Reads one length-prefixed JSON frame: a 4-byte big-endian length, then
/// that many bytes of UTF-8 JSON (`spec.md` §6).
pub async fn read_frame(stream: &mut TcpStream) -> std::io::Result<DonorFrame> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;

    serde_json::from_slice(&payload)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Encodes a frame the same way, used by tests and by any loopback agent
/// simulator exercising this source.
pub async fn write_frame(stream: &mut TcpStream, frame: &DonorFrame) -> std::io::Result<()> {
    let payload = serde_json::to_vec(frame)?;
    stream.write_u32(payload.len() as u32).await?;
    stream.write_all(&payload).await?;
    Ok(())
}

/// A TCP donor source reading length-prefixed JSON frames from an external
/// MT4/MT5 agent. A background listener task owns the connection; the main
/// loop reads the latest snapshot lock-free (`spec.md` §4.2, §5).
pub struct SocketDonorSource {
    id: SourceId,
    addr: String,
    kind: SocketKind,
    snapshot: Arc<RwLock<Option<DonorSnapshot>>>,
    connected: Arc<AtomicBool>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SocketDonorSource {
    pub fn new(id: SourceId, addr: String, kind: SocketKind) -> Self {
        Self {
            id,
            addr,
            kind,
            snapshot: Arc::new(RwLock::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            listener: Mutex::new(None),
        }
    }

    async fn run_listener(
        id: SourceId,
        addr: String,
        kind: SocketKind,
        snapshot: Arc<RwLock<Option<DonorSnapshot>>>,
        connected: Arc<AtomicBool>,
    ) {
        loop {
            match TcpStream::connect(&addr).await {
                Ok(mut stream) => {
                    info!(source = %id, kind = kind.label(), %addr, "donor socket connected");
                    connected.store(true, Ordering::SeqCst);

                    loop {
                        match read_frame(&mut stream).await {
                            Ok(frame) => match decode_frame(frame.clone(), &id) {
                                Ok((positions, orders)) => {
                                    *snapshot.write() = Some(DonorSnapshot {
                                        positions,
                                        orders,
                                        account_info: frame.account_info.map(|a| AccountInfo {
                                            login: a.login,
                                            balance: a.balance,
                                            equity: a.balance,
                                            free_margin: a.balance,
                                            currency: String::new(),
                                            server: String::new(),
                                        }),
                                    });
                                    debug!(source = %id, "donor snapshot updated");
                                }
                                Err(error) => {
                                    warn!(source = %id, %error, "failed to decode donor frame");
                                }
                            },
                            Err(error) => {
                                warn!(source = %id, %error, "donor socket read failed, reconnecting");
                                break;
                            }
                        }
                    }
                }
                Err(error) => {
                    warn!(source = %id, %addr, %error, "donor socket connect failed, retrying");
                }
            }

            connected.store(false, Ordering::SeqCst);
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }
}

#[async_trait]
impl DonorSource for SocketDonorSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    async fn connect(&self) -> Result<(), DonorSourceError> {
        let mut guard = self.listener.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let handle = tokio::spawn(Self::run_listener(
            self.id.clone(),
            self.addr.clone(),
            self.kind,
            self.snapshot.clone(),
            self.connected.clone(),
        ));
        *guard = Some(handle);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DonorSourceError> {
        let mut guard = self.listener.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn positions(&self) -> Result<Vec<DonorPosition>, DonorSourceError> {
        Ok(self
            .snapshot
            .read()
            .as_ref()
            .map(|s| s.positions.clone())
            .unwrap_or_default())
    }

    async fn orders(&self) -> Result<Vec<DonorPendingOrder>, DonorSourceError> {
        Ok(self
            .snapshot
            .read()
            .as_ref()
            .map(|s| s.orders.clone())
            .unwrap_or_default())
    }

    async fn account_info(&self) -> Result<AccountInfo, DonorSourceError> {
        self.snapshot
            .read()
            .as_ref()
            .and_then(|s| s.account_info.clone())
            .ok_or(DonorSourceError::Disconnected)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

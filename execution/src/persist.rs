use crate::correspondence::{CloseOrderInfo, CorrespondenceMap, OpenOrderInfo, PositionLinkSnapshot};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use trade_copier_domain::ids::{DonorKey, SourceId, Ticket};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wire shape of `sync_state.json` (`spec.md` §6). Keys are stringified
/// because JSON mandates string keys; donor-side keys encode the
/// `(source_id, ticket)` pair as `"{source_id}:{ticket}"`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PersistedState {
    pub timestamp: Option<DateTime<Utc>>,
    pub client_positions: IndexMap<String, PositionLinkSnapshot>,
    pub pending_orders: IndexMap<String, OpenOrderInfo>,
    pub pending_close_orders: IndexMap<String, String>,
    pub pending_close_orders_info: IndexMap<String, CloseOrderInfo>,
    pub close_order_to_client_position: IndexMap<String, String>,
    pub donor_pending_orders: IndexMap<String, String>,
}

fn encode_donor_key(key: &DonorKey) -> String {
    format!("{}:{}", key.source_id, key.ticket)
}

fn decode_donor_key(raw: &str) -> Option<DonorKey> {
    let (source, ticket) = raw.rsplit_once(':')?;
    let ticket: u64 = ticket.parse().ok()?;
    Some(DonorKey::new(SourceId::new(source.to_string()), Ticket(ticket)))
}

impl PersistedState {
    pub fn from_map(map: &CorrespondenceMap, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
            client_positions: map
                .pos_link_snapshots
                .iter()
                .map(|(k, v)| (encode_donor_key(k), v.clone()))
                .collect(),
            pending_orders: map
                .open_order_link
                .iter()
                .map(|(ticket, info)| (ticket.to_string(), info.clone()))
                .collect(),
            pending_close_orders: map
                .close_order_link
                .iter()
                .map(|(k, ticket)| (encode_donor_key(k), ticket.to_string()))
                .collect(),
            pending_close_orders_info: map
                .close_order_info
                .iter()
                .map(|(ticket, info)| (ticket.to_string(), info.clone()))
                .collect(),
            close_order_to_client_position: map
                .close_order_info
                .iter()
                .map(|(ticket, info)| (ticket.to_string(), info.client_position_ticket_to_close.to_string()))
                .collect(),
            donor_pending_orders: map
                .pending_order_link
                .iter()
                .map(|(k, ticket)| (encode_donor_key(k), ticket.to_string()))
                .collect(),
        }
    }

    /// Rebuild a [`CorrespondenceMap`] from the persisted wire shape.
    /// Callers must still validate every `pos_link` entry against live
    /// broker state before trusting it (`spec.md` §4.10 step 2).
    pub fn into_map(self) -> CorrespondenceMap {
        let mut map = CorrespondenceMap::new();

        for (key, snapshot) in self.client_positions {
            let Some(donor_key) = decode_donor_key(&key) else {
                continue;
            };
            map.pos_link.insert(donor_key.clone(), snapshot.client_ticket);
            map.pos_link_snapshots.insert(donor_key, snapshot);
        }

        for (ticket, info) in self.pending_orders {
            if let Ok(ticket) = ticket.parse::<u64>() {
                map.open_order_link.insert(Ticket(ticket), info);
            }
        }

        for (key, ticket) in self.pending_close_orders {
            let (Some(donor_key), Ok(ticket)) = (decode_donor_key(&key), ticket.parse::<u64>())
            else {
                continue;
            };
            map.close_order_link.insert(donor_key, Ticket(ticket));
        }

        for (ticket, info) in self.pending_close_orders_info {
            if let Ok(ticket) = ticket.parse::<u64>() {
                map.close_order_info.insert(Ticket(ticket), info);
            }
        }

        for (key, ticket) in self.donor_pending_orders {
            let (Some(donor_key), Ok(ticket)) = (decode_donor_key(&key), ticket.parse::<u64>())
            else {
                continue;
            };
            map.pending_order_link.insert(donor_key, Ticket(ticket));
        }

        map
    }
}

/// Write `bytes` to `path` via write-to-temp-then-rename, so a crash mid-write
/// never leaves a partially-written state file observable (`spec.md` §5).
pub async fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

pub async fn save_state(path: &Path, map: &CorrespondenceMap) -> Result<(), PersistError> {
    let persisted = PersistedState::from_map(map, Utc::now());
    let bytes = serde_json::to_vec_pretty(&persisted)?;
    persist_atomically(path, &bytes).await
}

/// Load the persisted Correspondence Map. Per `spec.md` §7 ("State file
/// corrupt / missing: log, proceed with empty map"), any read or parse
/// failure yields an empty map rather than propagating an error.
pub async fn load_state(path: &Path) -> CorrespondenceMap {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<PersistedState>(&bytes) {
            Ok(state) => {
                info!(path = %path.display(), "loaded persisted correspondence state");
                state.into_map()
            }
            Err(error) => {
                warn!(%error, "state file is corrupt, starting from an empty correspondence map");
                CorrespondenceMap::new()
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!("no persisted state file found, starting from an empty correspondence map");
            CorrespondenceMap::new()
        }
        Err(error) => {
            warn!(%error, "failed to read state file, starting from an empty correspondence map");
            CorrespondenceMap::new()
        }
    }
}

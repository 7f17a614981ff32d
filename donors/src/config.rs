use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single entry of `donors_config.json` (`spec.md` §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DonorEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DonorKind,
    pub account_number: u64,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DonorKind {
    PythonApi,
    SocketMt4,
    SocketMt5,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DonorsConfig {
    pub donors: Vec<DonorEntry>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DonorsConfigError {
    #[error("donor \"{id}\" of type socket_mt4/socket_mt5 is missing a port")]
    MissingPort { id: String },
}

impl DonorsConfig {
    /// Rejects socket entries missing a port (`spec.md` §6). Unknown
    /// `type` values are already rejected at deserialization time since
    /// [`DonorKind`] is a closed enum.
    pub fn validate(&self) -> Result<(), DonorsConfigError> {
        for donor in &self.donors {
            let needs_port = matches!(donor.kind, DonorKind::SocketMt4 | DonorKind::SocketMt5);
            if needs_port && donor.port.is_none() {
                return Err(DonorsConfigError::MissingPort {
                    id: donor.id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_socket_entry_without_a_port() {
        let config = DonorsConfig {
            donors: vec![DonorEntry {
                id: "mt4-a".into(),
                kind: DonorKind::SocketMt4,
                account_number: 1,
                host: Some("127.0.0.1".into()),
                port: None,
                description: None,
            }],
        };
        assert!(matches!(
            config.validate(),
            Err(DonorsConfigError::MissingPort { .. })
        ));
    }

    #[test]
    fn accepts_python_api_entry_without_a_port() {
        let config = DonorsConfig {
            donors: vec![DonorEntry {
                id: "api-a".into(),
                kind: DonorKind::PythonApi,
                account_number: 1,
                host: None,
                port: None,
                description: None,
            }],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_type_at_deserialization() {
        let raw = r#"{"donors":[{"id":"x","type":"carrier_pigeon","account_number":1}]}"#;
        assert!(serde_json::from_str::<DonorsConfig>(raw).is_err());
    }
}

use std::collections::BTreeSet;
use url::Url;

use crate::error::LedgerError;

/// Normalize `raw` into `host:port`.
///
/// Accepts bare `host:port` as well as full URLs (`http://host:port/path`);
/// scheme and path are dropped, a missing port falls back to the scheme default.
pub fn canonical_peer_address(raw: &str) -> Result<String, LedgerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidPeerAddress(raw.to_string()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|_| LedgerError::InvalidPeerAddress(raw.to_string()))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LedgerError::InvalidPeerAddress(raw.to_string()))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| LedgerError::InvalidPeerAddress(raw.to_string()))?;

    Ok(format!("{}:{}", host.to_ascii_lowercase(), port))
}

/// Known peers, kept sorted so every walk over them is reproducible.
#[derive(Debug, Default, Clone)]
pub struct PeerRegistry {
    peers: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one peer. Returns `false` when it was already known.
    pub fn register(&mut self, raw: &str) -> Result<bool, LedgerError> {
        let address = canonical_peer_address(raw)?;
        Ok(self.peers.insert(address))
    }

    /// Register a batch atomically: nothing is inserted if any entry is malformed.
    pub fn register_all<S: AsRef<str>>(&mut self, raw: &[S]) -> Result<usize, LedgerError> {
        let parsed = raw
            .iter()
            .map(|r| canonical_peer_address(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parsed
            .into_iter()
            .filter(|a| self.peers.insert(a.clone()))
            .count())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.peers.contains(address)
    }

    /// Peers in ascending address order.
    pub fn sorted(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

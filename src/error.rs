use thiserror::Error;

/// Failures surfaced by the ledger core. None of them is fatal to the node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed transaction fields; nothing was applied.
    #[error("invalid transaction: {0}")]
    Validation(String),

    /// The proof was found against a tip that is no longer current.
    #[error("stale proof: does not extend current tip {tip}")]
    StaleProof { tip: String },

    #[error("proof search cancelled: tip moved")]
    MiningCancelled,

    #[error("peer {peer} unavailable: {reason}")]
    PeerUnavailable { peer: String, reason: String },

    #[error("invalid chain at block {index}: {reason}")]
    InvalidChain { index: u64, reason: String },

    #[error("invalid peer address {0:?}")]
    InvalidPeerAddress(String),

    #[error("chain is empty")]
    EmptyChain,

    /// Node-side failure unrelated to the request, e.g. a crashed worker thread.
    #[error("internal error: {0}")]
    Internal(String),
}

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{CANONICAL_ENCODING_VERSION, GENESIS_PREVIOUS_HASH, GENESIS_PROOF, GENESIS_TIMESTAMP};
use crate::transaction::Transaction;

/// A single block in the chain holding the transactions it absorbed from the mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix millis (UTC)
    pub transactions: Vec<Transaction>,
    pub proof: u64, // Proof-of-Work nonce
    pub previous_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>, // time spent searching for `proof`
}

impl Block {
    /// The first block of every chain. Fully fixed, so all nodes agree on it.
    pub fn genesis() -> Self {
        Self {
            index: 0,
            timestamp: GENESIS_TIMESTAMP,
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            elapsed_ms: None,
        }
    }

    pub fn new(
        index: u64,
        timestamp: i64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
        elapsed_ms: Option<u64>,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            proof,
            previous_hash,
            elapsed_ms,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Versioned, byte-stable hash input.
    ///
    /// `v1:` followed by compact JSON of `CanonicalBlock`, whose fields are
    /// declared in lexicographic order. Numbers are plain decimal text and a
    /// missing `elapsed_ms` is `null`. Transactions keep their block order.
    pub fn canonical_encoding(&self) -> String {
        let view = CanonicalBlock {
            elapsed_ms: self.elapsed_ms,
            index: self.index,
            previous_hash: &self.previous_hash,
            proof: self.proof,
            timestamp: self.timestamp,
            transactions: self
                .transactions
                .iter()
                .map(|tx| CanonicalTransaction {
                    amount: tx.amount,
                    index: tx.index,
                    recipient: &tx.recipient,
                    sender: &tx.sender,
                    timestamp: tx.timestamp,
                })
                .collect(),
        };
        let json = serde_json::to_string(&view).expect("serialize canonical block");
        format!("v{CANONICAL_ENCODING_VERSION}:{json}")
    }

    /// SHA-256 of the canonical encoding, lowercase hex.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_encoding().as_bytes());
        hex::encode(hasher.finalize())
    }
}

// Field order below is the hash contract; keep it lexicographic.

#[derive(Serialize)]
struct CanonicalBlock<'a> {
    elapsed_ms: Option<u64>,
    index: u64,
    previous_hash: &'a str,
    proof: u64,
    timestamp: i64,
    transactions: Vec<CanonicalTransaction<'a>>,
}

#[derive(Serialize)]
struct CanonicalTransaction<'a> {
    amount: u64,
    index: usize,
    recipient: &'a str,
    sender: &'a str,
    timestamp: i64,
}

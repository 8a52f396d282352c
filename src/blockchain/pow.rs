use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::LedgerError;

/// How many nonces to try between cancellation checks.
const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Result of a successful proof search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    /// Digest that met the difficulty.
    pub digest: String,
    pub attempts: u64,
}

/// Observes the ledger's tip generation; fires once the tip moves.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: Arc<AtomicU64>,
    observed: u64,
}

impl CancelToken {
    pub fn new(generation: Arc<AtomicU64>) -> Self {
        let observed = generation.load(Ordering::SeqCst);
        Self {
            generation,
            observed,
        }
    }

    /// A token that never fires.
    pub fn never() -> Self {
        Self::new(Arc::new(AtomicU64::new(0)))
    }

    pub fn is_cancelled(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.observed
    }
}

/// Digest of `previous_hash ‖ previous_proof ‖ nonce`, numbers as decimal text.
pub fn proof_digest(previous_hash: &str, previous_proof: u64, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(previous_proof.to_string().as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// True when `digest` starts with at least `difficulty` hex zeros.
pub fn meets_difficulty(digest: &str, difficulty: u32) -> bool {
    let needed = difficulty as usize;
    digest.len() >= needed && digest.bytes().take(needed).all(|b| b == b'0')
}

/// Re-derive the digest for `nonce` and check it against the difficulty.
pub fn valid_proof(previous_hash: &str, previous_proof: u64, nonce: u64, difficulty: u32) -> bool {
    meets_difficulty(
        &proof_digest(previous_hash, previous_proof, nonce),
        difficulty,
    )
}

/// Brute-force the smallest nonce whose digest meets `difficulty`.
///
/// Blocking and CPU-bound; expected cost is about `16^difficulty` hashes.
/// Returns [`LedgerError::MiningCancelled`] if `cancel` fires first.
pub fn mine(
    previous_hash: &str,
    previous_proof: u64,
    difficulty: u32,
    cancel: &CancelToken,
) -> Result<Solution, LedgerError> {
    let mut nonce: u64 = 0;
    loop {
        if nonce % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(LedgerError::MiningCancelled);
        }
        let digest = proof_digest(previous_hash, previous_proof, nonce);
        if meets_difficulty(&digest, difficulty) {
            return Ok(Solution {
                nonce,
                digest,
                attempts: nonce + 1,
            });
        }
        nonce = nonce.wrapping_add(1);
    }
}

use super::Block;
use super::pow::valid_proof;
use crate::error::LedgerError;

/// Walk adjacent pairs checking linkage, index continuity and Proof-of-Work.
/// Chains of length 0 or 1 are trivially valid.
pub fn validate_chain(chain: &[Block], difficulty: u32) -> Result<(), LedgerError> {
    for pair in chain.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        let prev_hash = prev.compute_hash();

        if current.previous_hash != prev_hash {
            return Err(LedgerError::InvalidChain {
                index: current.index,
                reason: format!(
                    "previous_hash {} does not match {}",
                    current.previous_hash, prev_hash
                ),
            });
        }

        if prev.index.checked_add(1) != Some(current.index) {
            return Err(LedgerError::InvalidChain {
                index: current.index,
                reason: format!("index does not follow {}", prev.index),
            });
        }

        if !valid_proof(&prev_hash, prev.proof, current.proof, difficulty) {
            return Err(LedgerError::InvalidChain {
                index: current.index,
                reason: format!("proof {} fails difficulty {}", current.proof, difficulty),
            });
        }
    }
    Ok(())
}

/// Boolean form of [`validate_chain`].
pub fn is_valid_chain(chain: &[Block], difficulty: u32) -> bool {
    validate_chain(chain, difficulty).is_ok()
}

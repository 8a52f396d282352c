use actix_web::web;
use log::{debug, info, warn};
use std::time::Instant;

use super::model::MiningJob;
use super::pow::{Solution, mine};
use super::{Block, Ledger, MAX_MINING_ATTEMPTS};
use crate::error::LedgerError;

/// Search a proof for the current tip off the async executor, then seal the
/// mempool (plus the reward to `reward_to`) into a new block.
///
/// If the tip moves while searching, the search is cancelled or the sealed
/// proof is rejected as stale; either way we start over against the new tip,
/// up to [`MAX_MINING_ATTEMPTS`] times.
pub async fn mine_next_block(ledger: &Ledger, reward_to: &str) -> Result<Block, LedgerError> {
    mine_next_block_with(ledger, reward_to, |job: MiningJob| {
        mine(
            &job.previous_hash,
            job.previous_proof,
            job.difficulty,
            &job.cancel,
        )
    })
    .await
}

/// [`mine_next_block`] with the proof search supplied by the caller.
async fn mine_next_block_with<F>(
    ledger: &Ledger,
    reward_to: &str,
    search: F,
) -> Result<Block, LedgerError>
where
    F: Fn(MiningJob) -> Result<Solution, LedgerError> + Clone + Send + 'static,
{
    for attempt in 1..=MAX_MINING_ATTEMPTS {
        let job = ledger.mining_job()?;
        let snapshot = job.clone();
        let search = search.clone();
        let started = Instant::now();

        let outcome = web::block(move || search(snapshot)).await;

        let solution = match outcome {
            Ok(Ok(solution)) => solution,
            Ok(Err(LedgerError::MiningCancelled)) => {
                debug!("MINER - attempt {attempt}: tip moved during search, restarting");
                continue;
            }
            Ok(Err(e)) => return Err(e),
            Err(e) => {
                warn!("MINER - blocking pool failed: {e}");
                return Err(LedgerError::Internal(format!("proof search failed: {e}")));
            }
        };
        let elapsed = started.elapsed();
        debug!(
            "MINER - found nonce {} after {} attempts ({} ms), digest={}",
            solution.nonce,
            solution.attempts,
            elapsed.as_millis(),
            solution.digest
        );

        match ledger.mint_block_with_reward(
            solution.nonce,
            Some(&job.previous_hash),
            Some(elapsed),
            reward_to,
        ) {
            Ok(block) => {
                info!(
                    "MINER - forged block #{} in {} ms",
                    block.index,
                    elapsed.as_millis()
                );
                return Ok(block);
            }
            Err(LedgerError::StaleProof { tip }) => {
                warn!("MINER - attempt {attempt}: proof went stale, tip is now {tip}");
            }
            Err(e) => return Err(e),
        }
    }

    let tip = ledger.current_tip()?.compute_hash();
    Err(LedgerError::StaleProof { tip })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::pow::CancelToken;
    use crate::blockchain::{MINING_REWARD, MINING_REWARD_SENDER};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn solve(job: &MiningJob) -> Solution {
        mine(&job.previous_hash, job.previous_proof, job.difficulty, &CancelToken::never()).unwrap()
    }

    #[actix_web::test]
    async fn mines_reward_block() {
        let ledger = Ledger::new(2);
        ledger.submit_transaction("A", "B", 10).unwrap();

        let block = mine_next_block(&ledger, "node-x").await.unwrap();
        assert_eq!(block.index, 1);
        assert!(block.elapsed_ms.is_some());
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0].sender, "A");
        let reward = &block.transactions[1];
        assert_eq!(
            (reward.sender.as_str(), reward.recipient.as_str(), reward.amount),
            (MINING_REWARD_SENDER, "node-x", MINING_REWARD)
        );
        assert!(ledger.mempool().is_empty());
        assert!(ledger.is_valid());
    }

    #[actix_web::test]
    async fn consecutive_blocks_link_up() {
        let ledger = Ledger::new(2);
        for _ in 0..3 {
            mine_next_block(&ledger, "node-x").await.unwrap();
        }
        let (chain, len) = ledger.current_chain();
        assert_eq!(len, 4);
        assert_eq!(chain[3].previous_hash, chain[2].compute_hash());
        assert!(ledger.is_valid());
    }

    #[actix_web::test]
    async fn bad_reward_recipient_is_rejected() {
        let ledger = Ledger::new(1);
        let err = mine_next_block(&ledger, " ").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(ledger.len(), 1);
    }

    #[actix_web::test]
    async fn gives_up_after_repeated_cancellation() {
        let ledger = Ledger::new(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let err = mine_next_block_with(&ledger, "node-x", move |_job: MiningJob| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::MiningCancelled)
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), MAX_MINING_ATTEMPTS);
        assert_eq!(
            err,
            LedgerError::StaleProof {
                tip: Block::genesis().compute_hash()
            }
        );
        assert_eq!(ledger.len(), 1);
    }

    #[actix_web::test]
    async fn stale_proof_is_retried_on_new_tip() {
        let ledger = Arc::new(Ledger::new(2));
        let rival = ledger.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        // First search: a competing block lands before ours is sealed.
        let block = mine_next_block_with(&ledger, "node-x", move |job: MiningJob| {
            let sol = solve(&job);
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                rival.mint_block(sol.nonce, None, None).unwrap();
            }
            Ok(sol)
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(block.index, 2);
        let (chain, len) = ledger.current_chain();
        assert_eq!(len, 3);
        assert_eq!(block.previous_hash, chain[1].compute_hash());
        assert!(ledger.is_valid());
    }

    #[actix_web::test]
    async fn crashed_search_is_internal_error() {
        let ledger = Ledger::new(2);
        let search = |_job: MiningJob| -> Result<Solution, LedgerError> {
            panic!("search thread died")
        };
        let err = mine_next_block_with(&ledger, "node-x", search).await.unwrap_err();

        assert!(matches!(err, LedgerError::Internal(_)));
        assert_eq!(ledger.len(), 1);
    }
}

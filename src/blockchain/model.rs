use log::{debug, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::pow::{CancelToken, valid_proof};
use super::validator::{is_valid_chain, validate_chain};
use super::{Block, MINING_REWARD, MINING_REWARD_SENDER};
use crate::error::LedgerError;
use crate::transaction::{Submitted, Transaction};

/// Chain and mempool always change together, so they share one lock.
#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    mempool: Vec<Transaction>,
}

/// What a miner needs to search for the next proof without holding the lock.
#[derive(Debug, Clone)]
pub struct MiningJob {
    pub previous_hash: String,
    pub previous_proof: u64,
    pub difficulty: u32,
    pub cancel: CancelToken,
}

/// In-memory ledger: append-only chain plus pending transactions.
pub struct Ledger {
    state: Mutex<LedgerState>,
    difficulty: u32,
    clock: Arc<dyn Clock>,
    /// Bumped whenever the tip changes (append or replacement).
    tip_generation: Arc<AtomicU64>,
}

impl Ledger {
    /// Initialize a new ledger with the genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self::with_clock(difficulty, Arc::new(SystemClock))
    }

    pub fn with_clock(difficulty: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                chain: vec![Block::genesis()],
                mempool: Vec::new(),
            }),
            difficulty,
            clock,
            tip_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Queue a transaction for the next block.
    pub fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: u64,
    ) -> Result<Submitted, LedgerError> {
        let mut state = self.state.lock().expect("mutex poisoned");
        let tx_index = state.mempool.len();
        let tx = Transaction::new(sender, recipient, amount, self.clock.now_millis(), tx_index)?;
        let block_index = state.chain.last().ok_or(LedgerError::EmptyChain)?.index + 1;

        debug!(
            "mempool <- {} -> {} ({}) at position {}",
            tx.sender, tx.recipient, tx.amount, tx_index
        );
        state.mempool.push(tx);
        Ok(Submitted {
            tx_index,
            block_index,
        })
    }

    /// Seal the mempool into a new block carrying `proof`.
    ///
    /// `proof` must solve the current tip. If `previous_hash` is given it must
    /// also equal the current tip's hash. Either mismatch means the proof was
    /// found against an older tip and yields [`LedgerError::StaleProof`].
    pub fn mint_block(
        &self,
        proof: u64,
        previous_hash: Option<&str>,
        elapsed: Option<Duration>,
    ) -> Result<Block, LedgerError> {
        self.seal(proof, previous_hash, elapsed, None)
    }

    /// Same as [`Ledger::mint_block`] but pays the mining reward to `recipient`
    /// inside the same critical section.
    pub fn mint_block_with_reward(
        &self,
        proof: u64,
        previous_hash: Option<&str>,
        elapsed: Option<Duration>,
        recipient: &str,
    ) -> Result<Block, LedgerError> {
        self.seal(proof, previous_hash, elapsed, Some(recipient))
    }

    fn seal(
        &self,
        proof: u64,
        previous_hash: Option<&str>,
        elapsed: Option<Duration>,
        reward_to: Option<&str>,
    ) -> Result<Block, LedgerError> {
        let mut state = self.state.lock().expect("mutex poisoned");
        let tip = state.chain.last().ok_or(LedgerError::EmptyChain)?;
        let tip_hash = tip.compute_hash();

        let extends_tip = previous_hash.is_none_or(|h| h == tip_hash)
            && valid_proof(&tip_hash, tip.proof, proof, self.difficulty);
        if !extends_tip {
            return Err(LedgerError::StaleProof { tip: tip_hash });
        }
        let index = tip.index + 1;
        let now = self.clock.now_millis();

        // Validate the reward before touching the mempool.
        let reward = match reward_to {
            Some(recipient) => Some(Transaction::new(
                MINING_REWARD_SENDER,
                recipient,
                MINING_REWARD,
                now,
                state.mempool.len(),
            )?),
            None => None,
        };

        let mut transactions = std::mem::take(&mut state.mempool);
        transactions.extend(reward);
        let block = Block::new(
            index,
            now,
            transactions,
            proof,
            tip_hash,
            elapsed.map(|d| d.as_millis() as u64),
        );

        state.chain.push(block.clone());
        self.tip_generation.fetch_add(1, Ordering::SeqCst);
        info!(
            "sealed block #{} (proof={}, txs={})",
            block.index,
            block.proof,
            block.transactions.len()
        );
        Ok(block)
    }

    /// Return the last block in the chain.
    pub fn current_tip(&self) -> Result<Block, LedgerError> {
        let state = self.state.lock().expect("mutex poisoned");
        state.chain.last().cloned().ok_or(LedgerError::EmptyChain)
    }

    /// Snapshot the tip for an off-lock proof search.
    pub fn mining_job(&self) -> Result<MiningJob, LedgerError> {
        let state = self.state.lock().expect("mutex poisoned");
        let tip = state.chain.last().ok_or(LedgerError::EmptyChain)?;
        Ok(MiningJob {
            previous_hash: tip.compute_hash(),
            previous_proof: tip.proof,
            difficulty: self.difficulty,
            cancel: CancelToken::new(self.tip_generation.clone()),
        })
    }

    /// Copy of the chain and its length.
    pub fn current_chain(&self) -> (Vec<Block>, usize) {
        let state = self.state.lock().expect("mutex poisoned");
        (state.chain.clone(), state.chain.len())
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("mutex poisoned").chain.len()
    }

    /// Always false once constructed; the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.state.lock().expect("mutex poisoned").chain.is_empty()
    }

    pub fn mempool(&self) -> Vec<Transaction> {
        self.state.lock().expect("mutex poisoned").mempool.clone()
    }

    /// Validate the local chain.
    pub fn is_valid(&self) -> bool {
        let state = self.state.lock().expect("mutex poisoned");
        is_valid_chain(&state.chain, self.difficulty)
    }

    /// Swap in `candidate` if it is valid, rooted at our genesis and still
    /// strictly longer than the local chain. Pending transactions stay in the
    /// mempool.
    pub fn replace_chain(&self, candidate: Vec<Block>) -> Result<bool, LedgerError> {
        validate_chain(&candidate, self.difficulty)?;

        let mut state = self.state.lock().expect("mutex poisoned");
        if let Some(root) = candidate.first() {
            if state.chain.first() != Some(root) {
                return Err(LedgerError::InvalidChain {
                    index: root.index,
                    reason: "does not start at the genesis block".into(),
                });
            }
        }
        if candidate.len() <= state.chain.len() {
            debug!(
                "candidate chain ({}) no longer longer than local ({})",
                candidate.len(),
                state.chain.len()
            );
            return Ok(false);
        }
        let (old, new) = (state.chain.len(), candidate.len());
        state.chain = candidate;
        self.tip_generation.fetch_add(1, Ordering::SeqCst);
        info!("replaced local chain: {} -> {} blocks", old, new);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::clock::FixedClock;
    use crate::blockchain::pow::mine;
    use crate::blockchain::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};

    const DIFF: u32 = 2;

    fn tip_job(ledger: &Ledger) -> MiningJob {
        ledger.mining_job().unwrap()
    }

    fn mine_next(ledger: &Ledger) -> Block {
        let job = tip_job(ledger);
        let sol = mine(&job.previous_hash, job.previous_proof, job.difficulty, &job.cancel).unwrap();
        ledger
            .mint_block(sol.nonce, Some(&job.previous_hash), None)
            .unwrap()
    }

    #[test]
    fn starts_with_genesis() {
        let ledger = Ledger::new(DIFF);
        let (chain, len) = ledger.current_chain();
        assert_eq!(len, 1);
        assert_eq!(chain[0].index, 0);
        assert_eq!(chain[0].previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(chain[0].proof, GENESIS_PROOF);
        assert!(chain[0].transactions.is_empty());
        assert_eq!(ledger.current_tip().unwrap(), Block::genesis());
        assert!(!ledger.is_empty());
    }

    #[test]
    fn sequential_mints_stay_valid() {
        let ledger = Ledger::new(DIFF);
        assert!(ledger.is_valid());
        for n in 1..=5u64 {
            let block = mine_next(&ledger);
            assert_eq!(block.index, n);
            assert!(ledger.is_valid());
        }
        assert_eq!(ledger.len(), 6);
    }

    #[test]
    fn submit_then_mint_drains_mempool() {
        let clock = Arc::new(FixedClock::new(1_000));
        let ledger = Ledger::with_clock(DIFF, clock.clone());

        let receipt = ledger.submit_transaction("A", "B", 10).unwrap();
        assert_eq!(
            receipt,
            Submitted {
                tx_index: 0,
                block_index: 1
            }
        );
        assert_eq!(ledger.mempool().len(), 1);

        clock.set(2_000);
        let block = mine_next(&ledger);
        assert!(ledger.mempool().is_empty());
        assert_eq!(block.timestamp, 2_000);
        assert_eq!(block.transactions.len(), 1);
        let tx = &block.transactions[0];
        assert_eq!((tx.sender.as_str(), tx.recipient.as_str()), ("A", "B"));
        assert_eq!((tx.amount, tx.index, tx.timestamp), (10, 0, 1_000));
    }

    #[test]
    fn invalid_submission_leaves_mempool_untouched() {
        let ledger = Ledger::new(DIFF);
        assert!(matches!(
            ledger.submit_transaction("A", "", 10),
            Err(LedgerError::Validation(_))
        ));
        assert!(ledger.mempool().is_empty());
    }

    #[test]
    fn transaction_positions_follow_arrival_order() {
        let ledger = Ledger::new(DIFF);
        for (i, who) in ["x", "y", "z"].iter().enumerate() {
            let r = ledger.submit_transaction(who, "sink", 1).unwrap();
            assert_eq!(r.tx_index, i);
        }
        let block = mine_next(&ledger);
        let senders: Vec<_> = block.transactions.iter().map(|t| t.sender.as_str()).collect();
        assert_eq!(senders, ["x", "y", "z"]);
    }

    #[test]
    fn reward_goes_last_in_the_same_block() {
        let ledger = Ledger::new(DIFF);
        ledger.submit_transaction("A", "B", 10).unwrap();
        let job = tip_job(&ledger);
        let sol = mine(&job.previous_hash, job.previous_proof, DIFF, &job.cancel).unwrap();
        let block = ledger
            .mint_block_with_reward(sol.nonce, None, Some(Duration::from_millis(12)), "node-1")
            .unwrap();

        assert_eq!(block.elapsed_ms, Some(12));
        assert_eq!(block.transactions.len(), 2);
        let reward = &block.transactions[1];
        assert_eq!(reward.sender, MINING_REWARD_SENDER);
        assert_eq!(reward.recipient, "node-1");
        assert_eq!(reward.amount, MINING_REWARD);
        assert_eq!(reward.index, 1);
        assert!(ledger.mempool().is_empty());
    }

    #[test]
    fn stale_proof_is_rejected() {
        let ledger = Ledger::new(DIFF);
        let old = tip_job(&ledger);
        let sol = mine(&old.previous_hash, old.previous_proof, DIFF, &old.cancel).unwrap();

        mine_next(&ledger);
        assert!(old.cancel.is_cancelled());

        ledger.submit_transaction("A", "B", 1).unwrap();
        let err = ledger
            .mint_block(sol.nonce, Some(&old.previous_hash), None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::StaleProof { .. }));
        // the pending transaction is still there
        assert_eq!(ledger.mempool().len(), 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn proof_that_does_not_solve_tip_is_rejected() {
        let ledger = Ledger::new(DIFF);
        let job = tip_job(&ledger);
        let bad = (0..)
            .find(|n| !valid_proof(&job.previous_hash, job.previous_proof, *n, DIFF))
            .unwrap();
        assert!(matches!(
            ledger.mint_block(bad, None, None),
            Err(LedgerError::StaleProof { .. })
        ));
    }

    #[test]
    fn replace_requires_longer_valid_chain() {
        let donor = Ledger::new(DIFF);
        for _ in 0..3 {
            mine_next(&donor);
        }
        let (longer, _) = donor.current_chain();

        let local = Ledger::new(DIFF);
        mine_next(&local);
        let job = tip_job(&local);

        let mut tampered = longer.clone();
        tampered[1].timestamp += 1;
        assert!(matches!(
            local.replace_chain(tampered),
            Err(LedgerError::InvalidChain { .. })
        ));
        assert!(!local.replace_chain(longer[..2].to_vec()).unwrap());
        assert!(!job.cancel.is_cancelled());

        assert!(local.replace_chain(longer.clone()).unwrap());
        assert_eq!(local.current_chain().0, longer);
        assert!(job.cancel.is_cancelled());
    }

    #[test]
    fn replace_rejects_chain_with_foreign_root() {
        let root = Block::new(500, 42, Vec::new(), 7, "forged".into(), None);
        let mut forged = vec![root];
        while forged.len() < 3 {
            let prev = forged.last().unwrap();
            let (index, prev_hash) = (prev.index + 1, prev.compute_hash());
            let sol = mine(&prev_hash, prev.proof, DIFF, &CancelToken::never()).unwrap();
            forged.push(Block::new(index, 43, Vec::new(), sol.nonce, prev_hash, None));
        }
        assert!(is_valid_chain(&forged, DIFF));

        let ledger = Ledger::new(DIFF);
        let err = ledger.replace_chain(forged).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidChain { index: 500, .. }));
        assert_eq!(ledger.current_chain().0, vec![Block::genesis()]);
    }
}

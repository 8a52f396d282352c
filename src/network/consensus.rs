use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::blockchain::{Block, Ledger, validate_chain};
use crate::error::LedgerError;

/// A peer's answer to a chain request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerChain {
    pub length: usize,
    pub chain: Vec<Block>,
}

/// Fetches a peer's full chain. Any failure means "peer unavailable".
pub trait ChainSource {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<PeerChain, LedgerError>>;
}

/// Outcome of a conflict-resolution round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub replaced: bool,
    pub chain: Vec<Block>,
}

/// Longest-chain rule over responses already in address order.
///
/// A response is adopted only if its length is strictly greater than the best
/// seen so far (starting at `local_len`), it starts at the genesis block and
/// the chain validates. Equal lengths never win, so the first peer in order
/// keeps a tie.
pub fn select_longest_chain(
    local_len: usize,
    responses: Vec<(String, Result<PeerChain, LedgerError>)>,
    difficulty: u32,
) -> Option<(String, Vec<Block>)> {
    let genesis = Block::genesis();
    let mut best_len = local_len;
    let mut best = None;

    for (peer, response) in responses {
        let reply = match response {
            Ok(reply) => reply,
            Err(e) => {
                warn!("CONSENSUS - skipping {peer}: {e}");
                continue;
            }
        };
        if reply.length != reply.chain.len() {
            warn!(
                "CONSENSUS - skipping {peer}: reported length {} but sent {} blocks",
                reply.length,
                reply.chain.len()
            );
            continue;
        }
        if reply.length <= best_len {
            debug!(
                "CONSENSUS - {peer} has {} blocks, best is {best_len}",
                reply.length
            );
            continue;
        }
        if reply.chain.first() != Some(&genesis) {
            warn!("CONSENSUS - discarding chain from {peer}: not rooted at genesis");
            continue;
        }
        if let Err(e) = validate_chain(&reply.chain, difficulty) {
            warn!("CONSENSUS - discarding chain from {peer}: {e}");
            continue;
        }
        best_len = reply.length;
        best = Some((peer, reply.chain));
    }

    best
}

/// Ask every peer for its chain and adopt the longest valid one.
///
/// Requests run concurrently; replies are judged in sorted address order so the
/// result does not depend on which peer answered first.
pub async fn resolve_conflicts<S: ChainSource>(
    ledger: &Ledger,
    peers: &[String],
    source: &S,
) -> Resolution {
    let mut ordered = peers.to_vec();
    ordered.sort();
    ordered.dedup();

    let local_len = ledger.len();
    let replies = join_all(ordered.iter().map(|peer| source.fetch_chain(peer))).await;
    let responses = ordered.into_iter().zip(replies).collect();

    let replaced = match select_longest_chain(local_len, responses, ledger.difficulty()) {
        Some((peer, chain)) => {
            let length = chain.len();
            match ledger.replace_chain(chain) {
                Ok(true) => {
                    info!("CONSENSUS - adopted {length}-block chain from {peer}");
                    true
                }
                Ok(false) => false,
                Err(e) => {
                    warn!("CONSENSUS - chain from {peer} rejected on swap: {e}");
                    false
                }
            }
        }
        None => false,
    };

    Resolution {
        replaced,
        chain: ledger.current_chain().0,
    }
}

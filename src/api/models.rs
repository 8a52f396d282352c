use crate::blockchain::{Block, Ledger};
use crate::network::{HttpChainSource, PeerRegistry};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Shared node state: the ledger, known peers and the client used to reach them.
pub struct AppState {
    pub ledger: Ledger,
    pub peers: Mutex<PeerRegistry>,
    pub node_id: String,
    pub chain_source: HttpChainSource,
}

impl AppState {
    pub fn new(ledger: Ledger, node_id: String, chain_source: HttpChainSource) -> Self {
        Self {
            ledger,
            peers: Mutex::new(PeerRegistry::new()),
            node_id,
            chain_source,
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: &'static str,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
    pub elapsed_ms: Option<u64>,
}

/* ---------- TX API Models ---------- */

/// Fields are optional so a missing one is reported as a validation error.
#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<u64>,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: String,
    pub index: usize,
    pub block_index: u64,
}

#[derive(Serialize)]
pub struct MempoolResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Node API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct RegisterNodesResponse {
    pub message: &'static str,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub message: &'static str,
    pub replaced: bool,
    pub chain: Vec<Block>,
}

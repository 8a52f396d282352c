use log::debug;
use std::time::Duration;

use super::consensus::{ChainSource, PeerChain};
use crate::error::LedgerError;

/// Path every node serves its chain on.
pub const CHAIN_PATH: &str = "/api/v1/chain/";

/// Fetches peer chains over HTTP with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpChainSource {
    client: reqwest::Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<PeerChain, LedgerError> {
        let unavailable = |reason: String| LedgerError::PeerUnavailable {
            peer: peer.to_string(),
            reason,
        };
        let url = format!("http://{peer}{CHAIN_PATH}");
        debug!("CONSENSUS - GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("status {}", response.status())));
        }
        response
            .json::<PeerChain>()
            .await
            .map_err(|e| unavailable(format!("malformed payload: {e}")))
    }
}

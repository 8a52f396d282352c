use actix_web::{HttpResponse, Responder, get, web};
use log::{info, warn};

use super::error_response;
use super::models::{AppState, ChainResponse, MineResponse, ValidateResponse};
use crate::blockchain::mine_next_block;

/// Get the full chain (also what peers fetch during conflict resolution).
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let (chain, length) = state.ledger.current_chain();
    HttpResponse::Ok().json(ChainResponse {
        length,
        difficulty: state.ledger.difficulty(),
        chain,
    })
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ValidateResponse {
        valid: state.ledger.is_valid(),
        length: state.ledger.len(),
        difficulty: state.ledger.difficulty(),
    })
}

/// Mine a new block from the current mempool, paying the reward to this node.
#[get("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    match mine_next_block(&state.ledger, &state.node_id).await {
        Ok(block) => {
            info!(
                "GET /mine/ - block #{} with {} txs",
                block.index,
                block.transactions.len()
            );
            HttpResponse::Ok().json(MineResponse {
                message: "New Block Forged",
                index: block.index,
                transactions: block.transactions,
                proof: block.proof,
                previous_hash: block.previous_hash,
                elapsed_ms: block.elapsed_ms,
            })
        }
        Err(e) => {
            warn!("GET /mine/ - failed: {e}");
            error_response(&e)
        }
    }
}

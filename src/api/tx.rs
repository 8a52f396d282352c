use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::error_response;
use super::models::{AppState, MempoolResponse, NewTxRequest, NewTxResponse};
use crate::error::LedgerError;

/// Submit a new transaction into the mempool.
#[post("/transactions/new/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let body = body.into_inner();
    let (sender, recipient, amount) = match (body.sender, body.recipient, body.amount) {
        (Some(s), Some(r), Some(a)) => (s, r, a),
        _ => {
            warn!("POST /transactions/new/ - rejected: missing values");
            return error_response(&LedgerError::Validation("missing values".into()));
        }
    };

    match state.ledger.submit_transaction(&sender, &recipient, amount) {
        Ok(receipt) => {
            debug!(
                "POST /transactions/new/ - queued at {} for block {}",
                receipt.tx_index, receipt.block_index
            );
            HttpResponse::Created().json(NewTxResponse {
                message: format!(
                    "Transaction will be added to Block {}",
                    receipt.block_index
                ),
                index: receipt.tx_index,
                block_index: receipt.block_index,
            })
        }
        Err(e) => {
            warn!("POST /transactions/new/ - rejected: {e}");
            error_response(&e)
        }
    }
}

/// List pending transactions.
#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let transactions = state.ledger.mempool();
    HttpResponse::Ok().json(MempoolResponse {
        size: transactions.len(),
        transactions,
    })
}

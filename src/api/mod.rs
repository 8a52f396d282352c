mod chain;
mod health;
pub mod models;
mod nodes;
mod tx;

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::error::LedgerError;
pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::mine_block)
            .service(tx::post_transaction)
            .service(tx::get_mempool)
            .service(nodes::register_nodes)
            .service(nodes::resolve),
    );
}

/// Client mistakes are 400, a tip that moved under the miner is 409.
fn error_response(err: &LedgerError) -> HttpResponse {
    match err {
        LedgerError::Validation(_) | LedgerError::InvalidPeerAddress(_) => {
            HttpResponse::BadRequest().body(err.to_string())
        }
        LedgerError::StaleProof { .. } | LedgerError::MiningCancelled => {
            HttpResponse::Conflict().body(err.to_string())
        }
        _ => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

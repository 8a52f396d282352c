use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::error_response;
use super::models::{AppState, RegisterNodesRequest, RegisterNodesResponse, ResolveResponse};
use crate::network::resolve_conflicts;

/// Register peers by address (`host:port` or URL).
#[post("/nodes/register/")]
pub async fn register_nodes(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodesRequest>,
) -> impl Responder {
    if body.nodes.is_empty() {
        return HttpResponse::BadRequest().body("Please supply a valid list of nodes");
    }

    let mut peers = state.peers.lock().expect("mutex poisoned");
    match peers.register_all(&body.nodes) {
        Ok(added) => {
            info!(
                "POST /nodes/register/ - {} new, {} known",
                added,
                peers.len()
            );
            HttpResponse::Created().json(RegisterNodesResponse {
                message: "New nodes have been added",
                total_nodes: peers.sorted(),
            })
        }
        Err(e) => {
            warn!("POST /nodes/register/ - rejected: {e}");
            error_response(&e)
        }
    }
}

/// Run the longest-chain rule against every known peer.
#[get("/nodes/resolve/")]
pub async fn resolve(state: web::Data<AppState>) -> impl Responder {
    let peers = {
        let registry = state.peers.lock().expect("mutex poisoned");
        registry.sorted()
    };

    let resolution = resolve_conflicts(&state.ledger, &peers, &state.chain_source).await;
    let message = if resolution.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    HttpResponse::Ok().json(ResolveResponse {
        message,
        replaced: resolution.replaced,
        chain: resolution.chain,
    })
}

mod api;
mod blockchain;
mod config;
mod error;
mod network;
mod transaction;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use api::AppState;
use blockchain::Ledger;
use config::Config;
use network::HttpChainSource;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    let chain_source = HttpChainSource::new(config.peer_timeout).map_err(std::io::Error::other)?;

    info!(
        "⛓️ Starting ledger node {} at http://{}:{} (difficulty {})",
        config.node_id, config.host, config.port, config.difficulty
    );

    let state = web::Data::new(AppState::new(
        Ledger::new(config.difficulty),
        config.node_id.clone(),
        chain_source,
    ));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

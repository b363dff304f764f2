mod api;
mod blockchain;
mod config;
mod error;
mod miner;
mod node;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};
use std::io;
use std::sync::Arc;

use api::AppState;
use config::NodeConfig;
use node::Node;
use wallet::{Secp256k1Verifier, generate_keypair_hex};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let miner_address = match &config.miner_address {
        Some(address) => address.clone(),
        None => {
            // The private half is discarded: rewards are informational only.
            let (_, address) = generate_keypair_hex();
            address
        }
    };
    info!("Miner address: {miner_address}");

    let node = Arc::new(Node::new(
        config.chain,
        &miner_address,
        Box::new(Secp256k1Verifier::new()),
    ));
    let miner = node.spawn_miner(miner_address)?;

    info!(
        "⛓️ Starting ledger API at http://{}:{}",
        config.host, config.port
    );

    let state = web::Data::new(AppState { node: node.clone() });
    let served = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    node.shutdown();
    match miner.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("Miner stopped with an integrity failure: {e}");
            return Err(io::Error::other(e));
        }
        Err(_) => return Err(io::Error::other("miner thread panicked")),
    }
    served
}

use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::models::{
    AppState, ChainResponse, CommandResponse, ReadingEntry, ReadingsResponse, ValidateResponse,
};
use crate::transaction::MessagePayload;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let (chain, difficulty) = state.node.chain_snapshot();
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        difficulty,
        chain,
    })
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let (verification, length) = state.node.verify_chain();
    if let Some(failure) = verification.first_failure {
        info!(
            "VALIDATE - chain broken at block #{}: {}",
            failure.index, failure.fault
        );
    }
    HttpResponse::Ok().json(ValidateResponse {
        valid: verification.valid,
        length,
        first_failure: verification.first_failure,
    })
}

/// Structured readings carried by confirmed transactions, oldest first.
#[get("/readings/")]
pub async fn get_readings(state: web::Data<AppState>) -> impl Responder {
    let chain = state.node.get_chain();
    let mut readings = Vec::new();
    let mut skipped = 0usize;

    for (index, block) in chain.iter().enumerate() {
        for tx in &block.transactions {
            match MessagePayload::decode(&tx.message).map(|p| p.reading()) {
                Ok(Some(reading)) => readings.push(ReadingEntry {
                    block: index,
                    sender: tx.sender.clone(),
                    timestamp: tx.timestamp,
                    reading,
                }),
                Ok(None) => skipped += 1,
                Err(e) => {
                    debug!("READINGS - block #{index}: undecodable message: {e}");
                    skipped += 1;
                }
            }
        }
    }

    HttpResponse::Ok().json(ReadingsResponse {
        count: readings.len(),
        skipped,
        readings,
    })
}

/// Abandon the current proof-of-work search; its transactions are requeued.
#[post("/mining/interrupt/")]
pub async fn interrupt_mining(state: web::Data<AppState>) -> impl Responder {
    state.node.interrupt_mining();
    CommandResponse::ok("Mining interrupted")
}

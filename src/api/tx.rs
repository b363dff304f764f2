use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};
use std::time::Instant;

use super::models::{AppState, CommandResponse, PoolResponse, RegisterRequest, SubmitRequest};

/// Submit a signed transaction into the pool.
#[post("/transaction/")]
pub async fn post_transaction(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    let t0 = Instant::now();
    let req = match SubmitRequest::decode(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!("POST /transaction/ - rejected: {e}");
            return CommandResponse::rejected(&e);
        }
    };

    let client_timestamp = req.data.timestamp;
    let (tx, signature) = req.into_parts();
    debug!(
        "POST /transaction/ - received: message_len={}, client_timestamp={:?}",
        tx.message.len(),
        client_timestamp
    );

    match state.node.submit_transaction(tx, &signature) {
        Ok(()) => {
            info!(
                "POST /transaction/ - accepted ({} ms)",
                t0.elapsed().as_millis()
            );
            CommandResponse::ok("Transaction authorized successfully!")
        }
        Err(e) => CommandResponse::rejected(&e),
    }
}

/// Authorize a public key to submit transactions.
#[post("/register_sender/")]
pub async fn register_sender(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    match RegisterRequest::decode(&body) {
        Ok(req) => {
            state.node.register_sender(req.public_key.trim());
            CommandResponse::ok("Sender registered successfully")
        }
        Err(e) => {
            warn!("POST /register_sender/ - rejected: {e}");
            CommandResponse::rejected(&e)
        }
    }
}

/// Pending transactions, head first.
#[get("/pool/")]
pub async fn get_pool(state: web::Data<AppState>) -> impl Responder {
    let transactions = state.node.pending_transactions();
    HttpResponse::Ok().json(PoolResponse {
        size: transactions.len(),
        transactions,
    })
}

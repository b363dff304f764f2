use actix_web::{HttpResponse, Responder, get, web};

use super::models::AppState;

/// Liveness. Reports 503 once the miner has halted on an integrity fault.
#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    match state.node.fault() {
        None => HttpResponse::Ok().body("API is up and running 🦀"),
        Some(fault) => HttpResponse::ServiceUnavailable().body(format!("miner halted: {fault}")),
    }
}

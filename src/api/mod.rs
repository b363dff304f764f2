mod chain;
mod health;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::get_readings)
            .service(chain::interrupt_mining)
            .service(tx::post_transaction)
            .service(tx::register_sender)
            .service(tx::get_pool)
            .service(stats::get_stats)
            .service(wallet::create_wallet),
    );
}

pub mod model;
pub mod payload;
pub mod pool;
pub mod registry;

pub use model::Transaction;
pub use payload::{MessagePayload, Reading};
pub use pool::TransactionPool;
pub use registry::AuthorizationRegistry;

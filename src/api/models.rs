use std::sync::Arc;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, VerifyFailure};
use crate::error::LedgerError;
use crate::node::Node;
use crate::transaction::{Reading, Transaction};

/// Shared application state: the one node instance built at startup.
pub struct AppState {
    pub node: Arc<Node>,
}

/* ---------- Command Models ---------- */

/// Outcome of a command, success or not. Rejections never surface as
/// transport errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            message: message.into(),
        })
    }

    pub fn rejected(err: &LedgerError) -> HttpResponse {
        let status = match err {
            LedgerError::Authorization => StatusCode::FORBIDDEN,
            LedgerError::DuplicateTransaction => StatusCode::CONFLICT,
            LedgerError::Integrity { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::SignatureVerification(_) | LedgerError::Encoding(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        HttpResponse::build(status).json(Self {
            success: false,
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionPayload {
    pub sender: String,
    pub message: String,
    /// Client clock, logged only. The node stamps arrival time.
    pub timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub data: TransactionPayload,
    /// Hex DER signature over the canonical `{sender, message}` string.
    pub signature: String,
}

impl SubmitRequest {
    pub fn decode(body: &[u8]) -> Result<Self, LedgerError> {
        let req: Self = decode_json(body)?;
        if req.data.sender.trim().is_empty() || req.signature.trim().is_empty() {
            return Err(LedgerError::Encoding(
                "missing transaction sender or signature".into(),
            ));
        }
        Ok(req)
    }

    pub fn into_parts(self) -> (Transaction, String) {
        let TransactionPayload { sender, message, .. } = self.data;
        (Transaction::new(sender, message), self.signature)
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub public_key: String,
}

impl RegisterRequest {
    pub fn decode(body: &[u8]) -> Result<Self, LedgerError> {
        let req: Self = decode_json(body)?;
        if req.public_key.trim().is_empty() {
            return Err(LedgerError::Encoding("public key is required".into()));
        }
        Ok(req)
    }
}

fn decode_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, LedgerError> {
    serde_json::from_slice(body).map_err(|e| LedgerError::Encoding(e.to_string()))
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub first_failure: Option<VerifyFailure>,
}

/* ---------- Pool API Models ---------- */

#[derive(Serialize)]
pub struct PoolResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Readings API Models ---------- */

#[derive(Serialize)]
pub struct ReadingEntry {
    pub block: usize,
    pub sender: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub reading: Reading,
}

#[derive(Serialize)]
pub struct ReadingsResponse {
    pub count: usize,
    /// Confirmed messages that did not decode to a known reading.
    pub skipped: usize,
    pub readings: Vec<ReadingEntry>,
}

/* ---------- Wallet API Models (dev) ---------- */

#[derive(Serialize)]
pub struct NewWalletResponse {
    pub private_key: String,
    pub public_key: String,
}

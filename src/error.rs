use thiserror::Error;

/// Failures surfaced by the ledger core.
///
/// The `Display` text doubles as the human-readable message returned to
/// submitters, so keep it short and stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Sender not authorized!")]
    Authorization,

    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("Duplicate transaction!")]
    DuplicateTransaction,

    #[error("Integrity violation at block #{index}: {fault}")]
    Integrity { index: usize, fault: IntegrityFault },

    #[error("Malformed payload: {0}")]
    Encoding(String),
}

/// Which chain invariant a block broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityFault {
    #[error("hash does not match block contents")]
    HashMismatch,

    #[error("previous_hash does not link to the preceding block")]
    LinkageMismatch,

    #[error("hash does not meet the difficulty target")]
    InsufficientWork,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

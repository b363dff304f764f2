use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A signed data record submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex of the submitter's compressed public key.
    pub sender: String,
    /// Opaque payload (usually a JSON object, see `MessagePayload`).
    pub message: String,
    pub timestamp: i64, // Unix timestamp (UTC)
}

/// The part of a transaction covered by the signature. Field order is the
/// serialization order, which keeps the canonical form stable.
#[derive(Serialize)]
struct SigningView<'a> {
    sender: &'a str,
    message: &'a str,
}

impl Transaction {
    /// Build a transaction stamped with the current time.
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_timestamp(sender, message, Utc::now().timestamp())
    }

    pub fn with_timestamp(
        sender: impl Into<String>,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
            timestamp,
        }
    }

    /// Canonical `{sender, message}` string. This is what gets signed and
    /// what the block hash folds in; the timestamp is deliberately excluded.
    pub fn canonical_string(&self) -> String {
        let view = SigningView {
            sender: &self.sender,
            message: &self.message,
        };
        // Serializing two borrowed strings into JSON cannot fail.
        serde_json::to_string(&view).unwrap_or_default()
    }

    /// Same sender and message within `window_secs` of each other.
    pub fn is_replay_of(&self, other: &Transaction, window_secs: i64) -> bool {
        self.sender == other.sender
            && self.message == other.message
            && (self.timestamp - other.timestamp).abs() < window_secs
    }
}

#[cfg(test)]
mod tests {
    use super::Transaction;

    #[test]
    fn canonical_string_ignores_timestamp() {
        let a = Transaction::with_timestamp("02ab", "m", 1);
        let b = Transaction::with_timestamp("02ab", "m", 999);
        assert_eq!(a.canonical_string(), b.canonical_string());
        assert_eq!(a.canonical_string(), r#"{"sender":"02ab","message":"m"}"#);
    }

    #[test]
    fn canonical_string_escapes_message() {
        let tx = Transaction::with_timestamp("k", r#"{"temperature": "25"}"#, 0);
        assert_eq!(
            tx.canonical_string(),
            r#"{"sender":"k","message":"{\"temperature\": \"25\"}"}"#
        );
    }

    #[test]
    fn replay_window_is_exclusive() {
        let first = Transaction::with_timestamp("k", "m", 1_000);
        assert!(Transaction::with_timestamp("k", "m", 1_299).is_replay_of(&first, 300));
        assert!(Transaction::with_timestamp("k", "m", 701).is_replay_of(&first, 300));
        assert!(!Transaction::with_timestamp("k", "m", 1_300).is_replay_of(&first, 300));
        assert!(!Transaction::with_timestamp("k", "other", 1_000).is_replay_of(&first, 300));
        assert!(!Transaction::with_timestamp("j", "m", 1_000).is_replay_of(&first, 300));
    }
}

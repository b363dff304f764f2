use std::collections::HashSet;

/// Public keys allowed to submit transactions. Keys are never removed.
#[derive(Debug, Default)]
pub struct AuthorizationRegistry {
    keys: HashSet<String>,
}

impl AuthorizationRegistry {
    pub fn new() -> Self {
        Self {
            keys: HashSet::new(),
        }
    }

    /// Add a key. Returns `false` if it was already present.
    pub fn authorize(&mut self, public_key: impl Into<String>) -> bool {
        self.keys.insert(public_key.into())
    }

    pub fn is_authorized(&self, public_key: &str) -> bool {
        self.keys.contains(public_key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

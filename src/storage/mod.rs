//! Durable key/value storage behind the session.
//!
//! The browser shell backs this with localStorage; tests and native hosts
//! use the in-memory backend. The key layout is part of the persisted
//! contract and must not change between releases.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Key holding the short-lived bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key holding the long-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Key holding the JSON snapshot of the logged-in user.
pub const USER_KEY: &str = "user";
/// Key holding the local debt-block configuration override.
pub const DEBT_CONFIG_KEY: &str = "configuracionDeuda";

/// Durable string storage. Implementations must be safe to share across
/// tasks; all session and adapter state goes through this seam.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory backend used by tests and native hosts without a browser.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

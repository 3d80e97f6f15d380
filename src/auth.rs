use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

/// Read access to the persisted bearer-token storage.
///
/// The stores are written by the sign-in flow and cleared on sign-out; the
/// clients only ever read, and they read on every request so a token swap
/// takes effect immediately.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-process token storage. The default store for long-lived applications.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a token under `key`. Called by the sign-in collaborator.
    pub fn set(&self, key: impl Into<String>, token: impl Into<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), token.into());
        }
    }

    /// Removes a token. Called by the sign-out collaborator.
    pub fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }
}

/// Token storage backed by process environment variables, using the storage
/// key as the variable name. Convenient for CLI tools and CI.
#[derive(Debug, Default)]
pub struct EnvTokenStore;

impl EnvTokenStore {
    pub fn new() -> Self {
        Self
    }
}

impl TokenStore for EnvTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|token| !token.is_empty())
    }
}

/// Resolves the current bearer token: the primary key first, then the legacy
/// pre-migration key. Empty strings count as absent, so a blank primary
/// entry still falls through to the legacy key. `None` means the call
/// proceeds unauthenticated.
pub fn resolve_token(store: &dyn TokenStore, key: &str, legacy_key: &str) -> Option<String> {
    store
        .get(key)
        .filter(|token| !token.is_empty())
        .or_else(|| store.get(legacy_key).filter(|token| !token.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "tok-1");
        assert_eq!(store.get("k"), Some("tok-1".to_string()));

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn resolution_prefers_primary_key() {
        let store = MemoryTokenStore::new();
        store.set("covenant.auth_token", "new");
        store.set("auth_token", "old");

        let token = resolve_token(&store, "covenant.auth_token", "auth_token");
        assert_eq!(token, Some("new".to_string()));
    }

    #[test]
    fn resolution_falls_back_to_legacy_key() {
        let store = MemoryTokenStore::new();
        store.set("auth_token", "old");

        let token = resolve_token(&store, "covenant.auth_token", "auth_token");
        assert_eq!(token, Some("old".to_string()));
    }

    #[test]
    fn empty_tokens_count_as_absent() {
        let store = MemoryTokenStore::new();
        store.set("covenant.auth_token", "");

        assert_eq!(resolve_token(&store, "covenant.auth_token", "auth_token"), None);

        // a blank primary entry still falls through to the legacy key
        store.set("auth_token", "old");
        assert_eq!(
            resolve_token(&store, "covenant.auth_token", "auth_token"),
            Some("old".to_string())
        );
    }
}

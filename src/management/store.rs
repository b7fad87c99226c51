use std::{collections::HashMap, fmt, future::Future};

use tokio::sync::RwLock;

use crate::error::Result;

/// The five persisted AuthState entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    AccessToken,
    RefreshToken,
    /// Absolute expiry in epoch milliseconds, stored as a decimal string.
    TokenExpiry,
    /// Anti-CSRF nonce, only present during an authorization round-trip.
    AuthState,
    /// PKCE secret, only present during an authorization round-trip.
    CodeVerifier,
}

impl StoreKey {
    pub const ALL: [StoreKey; 5] = [
        StoreKey::AccessToken,
        StoreKey::RefreshToken,
        StoreKey::TokenExpiry,
        StoreKey::AuthState,
        StoreKey::CodeVerifier,
    ];

    pub const TOKENS: [StoreKey; 3] = [
        StoreKey::AccessToken,
        StoreKey::RefreshToken,
        StoreKey::TokenExpiry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::AccessToken => "spotify_access_token",
            StoreKey::RefreshToken => "spotify_refresh_token",
            StoreKey::TokenExpiry => "spotify_token_expiry",
            StoreKey::AuthState => "spotify_auth_state",
            StoreKey::CodeVerifier => "spotify_code_verifier",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value persistence for the authentication state.
///
/// Each call is atomic with respect to other calls on the same store.
/// `delete` of an absent key is not an error.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: StoreKey) -> impl Future<Output = Option<String>> + Send;

    fn set(&self, key: StoreKey, value: String) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, key: StoreKey) -> impl Future<Output = Result<()>> + Send;

    /// Writes several entries. Stores that persist on every write should
    /// override this to persist once.
    fn set_many(
        &self,
        entries: Vec<(StoreKey, String)>,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            for (key, value) in entries {
                self.set(key, value).await?;
            }
            Ok(())
        }
    }

    fn delete_many(&self, keys: &[StoreKey]) -> impl Future<Output = Result<()>> + Send {
        async move {
            for key in keys {
                self.delete(*key).await?;
            }
            Ok(())
        }
    }
}

/// Process-local store, used by tests and short-lived embeddings.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<StoreKey, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: StoreKey) -> Option<String> {
        self.entries.read().await.get(&key).cloned()
    }

    async fn set(&self, key: StoreKey, value: String) -> Result<()> {
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: StoreKey) -> Result<()> {
        self.entries.write().await.remove(&key);
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(StoreKey, String)>) -> Result<()> {
        let mut map = self.entries.write().await;
        map.extend(entries);
        Ok(())
    }

    async fn delete_many(&self, keys: &[StoreKey]) -> Result<()> {
        let mut map = self.entries.write().await;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_are_stable() {
        let names: Vec<_> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "spotify_access_token",
                "spotify_refresh_token",
                "spotify_token_expiry",
                "spotify_auth_state",
                "spotify_code_verifier",
            ]
        );
        for key in StoreKey::ALL {
            assert_eq!(StoreKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(StoreKey::from_name("spotify_other"), None);
    }

    #[tokio::test]
    async fn memory_store_get_set_delete() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(StoreKey::AccessToken).await, None);

        store
            .set(StoreKey::AccessToken, "at_1".to_string())
            .await
            .unwrap();
        assert_eq!(store.get(StoreKey::AccessToken).await.as_deref(), Some("at_1"));

        store.delete(StoreKey::AccessToken).await.unwrap();
        assert_eq!(store.get(StoreKey::AccessToken).await, None);

        // deleting an absent key is fine
        store.delete(StoreKey::AccessToken).await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_bulk_operations() {
        let store = MemoryTokenStore::new();
        store
            .set_many(vec![
                (StoreKey::AccessToken, "at".into()),
                (StoreKey::RefreshToken, "rt".into()),
                (StoreKey::AuthState, "state".into()),
            ])
            .await
            .unwrap();
        assert_eq!(store.len().await, 3);

        store.delete_many(&StoreKey::TOKENS).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(StoreKey::AuthState).await.as_deref(), Some("state"));
    }
}

use async_trait::async_trait;

use super::{Credentials, StoredSession};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Vault(#[from] vault::tokio::Error<rusqlite::Error>),
    #[error("failed to encode identity: {0}")]
    Identity(#[from] serde_json::Error),
    /// Only produced by the in-memory test store.
    #[cfg(test)]
    #[error("session store is unavailable")]
    Unavailable,
}

/// Durable storage for the session, surviving restarts.
///
/// The store holds at most one session. Implementations must make `save` and
/// `clear` all-or-nothing.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<StoredSession, StoreError>;

    async fn save(&self, credentials: &Credentials) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

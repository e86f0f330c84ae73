use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Credentials, SessionStore, StoreError, StoredSession};

/// A store that keeps everything in memory and can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    stored: Mutex<StoredSession>,
    writes: Mutex<usize>,
    failing: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(stored: StoredSession) -> Self {
        Self {
            stored: Mutex::new(stored),
            ..Self::default()
        }
    }

    pub fn contents(&self) -> StoredSession {
        self.stored.lock().clone()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }

    pub fn fail(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    fn check(&self) -> Result<(), StoreError> {
        if *self.failing.lock() {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> Result<StoredSession, StoreError> {
        self.check()?;
        Ok(self.contents())
    }

    async fn save(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.check()?;
        *self.stored.lock() = StoredSession::from_credentials(credentials)?;
        *self.writes.lock() += 1;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        *self.stored.lock() = StoredSession::default();
        *self.writes.lock() += 1;
        Ok(())
    }
}

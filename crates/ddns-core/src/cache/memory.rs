// # Memory Change Cache
//
// In-memory implementation of CacheStore.
//
// Nothing survives the process, so every run starts from the empty
// snapshot. Useful for tests and for embedding the engine in a long-lived
// process that schedules runs itself.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::CacheState;
use crate::Error;
use crate::traits::cache_store::CacheStore;

/// In-memory change cache
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<RwLock<CacheState>>,
}

impl MemoryCache {
    /// Create a cache holding the empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-seeded with a snapshot
    pub fn with_state(state: CacheState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> CacheState {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn load(&self) -> Result<CacheState, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn commit(&self, state: &CacheState) -> Result<(), Error> {
        *self.inner.write().await = state.clone();
        Ok(())
    }
}

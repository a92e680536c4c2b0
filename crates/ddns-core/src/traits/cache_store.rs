// # Cache Store Trait
//
// Defines the interface for persisting the last reconciled snapshot.
//
// ## Implementations
//
// - File-based: [`crate::cache::ChangeCache`]
// - In-memory: [`crate::cache::MemoryCache`]

use async_trait::async_trait;

use crate::cache::CacheState;

/// Trait for change cache implementations
///
/// A store holds exactly one [`CacheState`]. There is a single writer per
/// process and no locking between processes.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the stored snapshot
    ///
    /// A store that has never been written yields [`CacheState::default`]
    /// and persists it.
    async fn load(&self) -> Result<CacheState, crate::Error>;

    /// Replace the stored snapshot
    ///
    /// The previous snapshot is discarded entirely.
    async fn commit(&self, state: &CacheState) -> Result<(), crate::Error>;
}

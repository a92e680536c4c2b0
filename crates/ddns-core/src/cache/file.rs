// # File Change Cache
//
// File-backed implementation of CacheStore.
//
// ## Write Strategy
//
// The snapshot is serialized into a sibling `.tmp` file which is then
// renamed over the cache path, so readers never see a partial file.
//
// ## Error Policy
//
// File system errors are returned as the original `std::io::Error`
// (`Error::Io`) so permission and disk problems stay diagnosable.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::CacheState;
use crate::Error;
use crate::config::DEFAULT_CACHE_PATH;
use crate::traits::cache_store::CacheStore;

/// File-backed change cache
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::cache::{CacheState, ChangeCache};
/// use ddns_core::traits::CacheStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = ChangeCache::new("/var/lib/ddns/cache.json");
///
///     let state = cache.load().await?;
///     if state.needs_update("203.0.113.7", "", None) {
///         cache.commit(&CacheState::new("203.0.113.7", "", None)).await?;
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChangeCache {
    path: PathBuf,
}

impl ChangeCache {
    /// Create a cache stored at `path`
    ///
    /// Nothing is read until [`CacheStore::load`] is called.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot via temp file and rename
    async fn write_state(&self, state: &CacheState) -> Result<(), Error> {
        let json = serde_json::to_string(state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        fs::rename(&temp_path, &self.path).await?;

        tracing::trace!("Cache written to file: {}", self.path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

impl Default for ChangeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PATH)
    }
}

#[async_trait]
impl CacheStore for ChangeCache {
    async fn load(&self) -> Result<CacheState, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "Cache file does not exist, creating empty cache: {}",
                    self.path.display()
                );
                let state = CacheState::default();
                self.write_state(&state).await?;
                return Ok(state);
            }
            Err(e) => return Err(e.into()),
        };

        let state: CacheState = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded cache: ipv4={:?} ipv6={:?} mod_time={:?}",
            state.ipv4,
            state.ipv6,
            state.mod_time
        );
        Ok(state)
    }

    async fn commit(&self, state: &CacheState) -> Result<(), Error> {
        self.write_state(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_first_load_creates_empty_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = ChangeCache::new(&path);
        let state = cache.load().await.unwrap();
        assert_eq!(state, CacheState::default());

        // An empty snapshot was persisted and is valid JSON
        assert!(path.exists());
        let raw = std::fs::read_to_string(&path).unwrap();
        let persisted: CacheState = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, CacheState::default());
    }

    #[tokio::test]
    async fn test_commit_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ChangeCache::new(&path);

        let mod_time = Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let state = CacheState::new("203.0.113.7", "2001:db8::7", Some(mod_time));
        cache.commit(&state).await.unwrap();

        let reloaded = ChangeCache::new(&path).load().await.unwrap();
        assert_eq!(reloaded, state);
        assert!(!reloaded.needs_update("203.0.113.7", "2001:db8::7", Some(mod_time)));
    }

    #[tokio::test]
    async fn test_commit_replaces_whole_record() {
        let dir = tempdir().unwrap();
        let cache = ChangeCache::new(dir.path().join("cache.json"));

        let mod_time = Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap();
        cache
            .commit(&CacheState::new("1.1.1.1", "2001:db8::1", Some(mod_time)))
            .await
            .unwrap();
        cache
            .commit(&CacheState::new("2.2.2.2", "", None))
            .await
            .unwrap();

        let state = cache.load().await.unwrap();
        assert_eq!(state, CacheState::new("2.2.2.2", "", None));
    }

    #[tokio::test]
    async fn test_json_field_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ChangeCache::new(&path);
        cache
            .commit(&CacheState::new("1.2.3.4", "", None))
            .await
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["IPv4Address"], "1.2.3.4");
        assert_eq!(raw["IPv6Address"], "");
        assert!(raw["ModTime"].is_null());
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ChangeCache::new(&path);
        cache.commit(&CacheState::default()).await.unwrap();

        assert!(!cache.temp_path().exists());
    }

    #[tokio::test]
    async fn test_read_error_propagates_io() {
        let dir = tempdir().unwrap();
        // A directory at the cache path cannot be read as a file
        let cache = ChangeCache::new(dir.path());

        let err = cache.load().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_corrupted_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"corrupted json data").unwrap();

        let err = ChangeCache::new(&path).load().await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}

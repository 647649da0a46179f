use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::ports::FilterCache;
use crate::utils::error::Result;

/// Unbounded in-process cache of filter responses, keyed by the MD5 of the raw upload.
#[derive(Debug, Default)]
pub struct InMemoryFilterCache {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryFilterCache {
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

pub fn content_key(raw_input: &[u8]) -> String {
    format!("{:x}", md5::compute(raw_input))
}

#[async_trait]
impl FilterCache for InMemoryFilterCache {
    async fn get(&self, raw_input: &[u8]) -> Result<Option<Bytes>> {
        let key = content_key(raw_input);

        match self.entries.read().await.get(&key) {
            Some(response) => {
                info!(key = %key, "Cache hit");
                Ok(Some(response.clone()))
            }
            None => {
                info!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    async fn save(&self, raw_input: &[u8], response: Bytes) -> Result<()> {
        let key = content_key(raw_input);

        // first write wins; entries never change once stored
        self.entries
            .write()
            .await
            .entry(key.clone())
            .or_insert(response);

        info!(key = %key, "Cache updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_is_md5_hex() {
        assert_eq!(content_key(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_key(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn test_get_on_empty_cache_is_miss() {
        let cache = InMemoryFilterCache::new();

        assert!(cache.get(b"some upload").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_then_get_returns_same_bytes() {
        let cache = InMemoryFilterCache::new();
        let response = Bytes::from_static(br#"[{"id":1,"name":"Dublin"}]"#);

        cache.save(b"upload", response.clone()).await.unwrap();

        assert_eq!(cache.get(b"upload").await.unwrap(), Some(response));
        assert!(cache.get(b"upload ").await.unwrap().is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_entries_are_immutable_once_stored() {
        let cache = InMemoryFilterCache::new();

        cache.save(b"upload", Bytes::from_static(b"[]")).await.unwrap();
        cache.save(b"upload", Bytes::from_static(b"[1]")).await.unwrap();

        assert_eq!(cache.get(b"upload").await.unwrap(), Some(Bytes::from_static(b"[]")));
    }
}

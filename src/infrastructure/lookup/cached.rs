use std::sync::Mutex;

use async_trait::async_trait;

use super::{FetchedInterface, InterfaceSource, LookupError};
use crate::domain::network::Network;
use crate::store::AbiCache;

/// Serves repeated lookups from the SQLite cache
pub struct CachedInterfaceSource<S> {
    inner: S,
    cache: Option<Mutex<AbiCache>>,
}

impl<S: InterfaceSource> CachedInterfaceSource<S> {
    pub fn new(inner: S, cache: Option<AbiCache>) -> Self {
        Self {
            inner,
            cache: cache.map(Mutex::new),
        }
    }

    fn cached(&self, network: &Network, address: &str) -> Option<String> {
        let cache = self.cache.as_ref()?.lock().ok()?;
        match cache.get_abi(&network.name, address) {
            Ok(entry) => entry.map(|entry| entry.abi_json),
            Err(err) => {
                tracing::warn!(error = %err, "abi cache read failed");
                None
            }
        }
    }

    fn store(&self, network: &Network, address: &str, abi_json: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let Ok(cache) = cache.lock() else {
            return;
        };
        if let Err(err) = cache.save_abi(&network.name, address, abi_json) {
            tracing::warn!(error = %err, "abi cache write failed");
        }
    }
}

#[async_trait]
impl<S: InterfaceSource> InterfaceSource for CachedInterfaceSource<S> {
    async fn fetch(
        &self,
        network: &Network,
        address: &str,
        refresh: bool,
    ) -> Result<FetchedInterface, LookupError> {
        if !refresh {
            if let Some(abi_json) = self.cached(network, address) {
                tracing::debug!(network = %network.name, %address, "abi cache hit");
                return Ok(FetchedInterface {
                    abi_json,
                    from_cache: true,
                });
            }
        }

        let fetched = self.inner.fetch(network, address, refresh).await?;
        self.store(network, address, &fetched.abi_json);
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::builtin_networks;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        reply: Result<String, LookupError>,
    }

    #[async_trait]
    impl InterfaceSource for CountingSource {
        async fn fetch(
            &self,
            _network: &Network,
            _address: &str,
            _refresh: bool,
        ) -> Result<FetchedInterface, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map(|abi_json| FetchedInterface {
                abi_json,
                from_cache: false,
            })
        }
    }

    fn source(reply: Result<String, LookupError>) -> CachedInterfaceSource<CountingSource> {
        CachedInterfaceSource::new(
            CountingSource {
                calls: AtomicUsize::new(0),
                reply,
            },
            Some(AbiCache::open_in_memory().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let network = builtin_networks().remove(0);
        let source = source(Ok("[]".to_string()));

        let first = source.fetch(&network, "0xabc", false).await.unwrap();
        assert!(!first.from_cache);
        let second = source.fetch(&network, "0xABC", false).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);

        let refreshed = source.fetch(&network, "0xabc", true).await.unwrap();
        assert!(!refreshed.from_cache);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let network = builtin_networks().remove(0);
        let source = source(Err(LookupError::Rejected("nope".into())));
        assert!(source.fetch(&network, "0xabc", false).await.is_err());
        assert!(source.fetch(&network, "0xabc", false).await.is_err());
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_without_cache_always_fetches() {
        let network = builtin_networks().remove(0);
        let source = CachedInterfaceSource::new(
            CountingSource {
                calls: AtomicUsize::new(0),
                reply: Ok("[]".to_string()),
            },
            None,
        );
        source.fetch(&network, "0xabc", false).await.unwrap();
        source.fetch(&network, "0xabc", false).await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }
}

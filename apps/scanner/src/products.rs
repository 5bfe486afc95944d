//! Cache-first read path over the backend client.
//!
//! Each getter serves its sub-object from the normalized cache when present
//! (unless the caller forces a refresh), fetches otherwise, and merges the
//! settled result back in. A fetch error propagates without touching the
//! cache, so sibling data for the same code stays intact and retrievable.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{ProductCache, ProductMatch, ProductPatch};
use crate::models::product::{ProductSnapshot, ReviewSummary, SafetyAnalysis};
use crate::product_client::{ClientError, FetchOptions, ProductFetcher};

pub struct ProductService {
    fetcher: Arc<dyn ProductFetcher>,
    cache: Mutex<ProductCache>,
}

impl ProductService {
    pub fn new(fetcher: Arc<dyn ProductFetcher>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(ProductCache::new()),
        }
    }

    /// Basic product info for a scanned code. `Ok(None)` means the backend
    /// has no product for it, which is a settled, cacheable outcome.
    pub async fn get_product(
        &self,
        code: &str,
        opts: &FetchOptions,
    ) -> Result<Option<ProductSnapshot>, ClientError> {
        if !opts.force_refresh {
            let cache = self.cache.lock().await;
            if let Some(matched) = cache.get(code).and_then(|r| r.basic.clone()) {
                debug!(code, "product served from cache");
                return Ok(matched.into_snapshot());
            }
        }

        let fetched = self.fetcher.fetch_product(code).await?;
        let matched = match &fetched {
            Some(snapshot) => ProductMatch::Found(snapshot.clone()),
            None => ProductMatch::NoMatch,
        };
        self.cache.lock().await.apply(code, ProductPatch::basic(matched));
        Ok(fetched)
    }

    /// Review summary, fetched on demand. A settled `null` is returned but
    /// not cached, so the next call asks again; a present summary (even an
    /// empty one) replaces whatever was cached.
    pub async fn get_reviews(
        &self,
        code: &str,
        opts: &FetchOptions,
    ) -> Result<Option<ReviewSummary>, ClientError> {
        if !opts.force_refresh {
            let cache = self.cache.lock().await;
            if let Some(reviews) = cache.get(code).and_then(|r| r.reviews.clone()) {
                debug!(code, "review summary served from cache");
                return Ok(Some(reviews));
            }
        }

        let fetched = self.fetcher.fetch_reviews(code, opts).await?;
        if let Some(reviews) = &fetched {
            self.cache
                .lock()
                .await
                .apply(code, ProductPatch::reviews(reviews.clone()));
        }
        Ok(fetched)
    }

    /// Safety analysis, fetched on demand. Same caching contract as
    /// [`Self::get_reviews`].
    pub async fn get_safety(
        &self,
        code: &str,
        opts: &FetchOptions,
    ) -> Result<Option<SafetyAnalysis>, ClientError> {
        if !opts.force_refresh {
            let cache = self.cache.lock().await;
            if let Some(safety) = cache.get(code).and_then(|r| r.safety.clone()) {
                debug!(code, "safety analysis served from cache");
                return Ok(Some(safety));
            }
        }

        let fetched = self.fetcher.fetch_safety(code, opts).await?;
        if let Some(safety) = &fetched {
            self.cache
                .lock()
                .await
                .apply(code, ProductPatch::safety(safety.clone()));
        }
        Ok(fetched)
    }

    #[cfg(test)]
    async fn cached_record(&self, code: &str) -> Option<crate::cache::CachedRecord> {
        self.cache.lock().await.get(code).cloned()
    }
}

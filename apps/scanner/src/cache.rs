//! Normalized response cache for product lookups.
//!
//! Records are keyed by the scanned code (the business key), not by any
//! backend-internal id, so the basic-info query and the on-demand
//! reviews/safety queries for the same code all address the same slot.
//! Writes go through a field-level merge: a sub-object present in an
//! incoming response replaces the cached value, a sub-object the query did
//! not fetch preserves it. A later, narrower query can therefore never wipe
//! out data an earlier query already paid for.

use std::collections::HashMap;

use crate::models::product::{ProductSnapshot, ReviewSummary, SafetyAnalysis};

/// Settled outcome of the primary product query for a code.
///
/// `NoMatch` is a valid, cacheable result distinct from a fetch error: the
/// backend answered, it just has no product for this code.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductMatch {
    Found(ProductSnapshot),
    NoMatch,
}

impl ProductMatch {
    pub fn into_snapshot(self) -> Option<ProductSnapshot> {
        match self {
            ProductMatch::Found(snapshot) => Some(snapshot),
            ProductMatch::NoMatch => None,
        }
    }
}

/// Everything fetched so far for one code. `None` fields have simply never
/// been fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedRecord {
    pub basic: Option<ProductMatch>,
    pub reviews: Option<ReviewSummary>,
    pub safety: Option<SafetyAnalysis>,
}

/// The contribution of one settled fetch. Fields the query did not request
/// stay `None` and leave the cached value untouched on merge.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub basic: Option<ProductMatch>,
    pub reviews: Option<ReviewSummary>,
    pub safety: Option<SafetyAnalysis>,
}

impl ProductPatch {
    pub fn basic(matched: ProductMatch) -> Self {
        Self {
            basic: Some(matched),
            ..Self::default()
        }
    }

    pub fn reviews(reviews: ReviewSummary) -> Self {
        Self {
            reviews: Some(reviews),
            ..Self::default()
        }
    }

    pub fn safety(safety: SafetyAnalysis) -> Self {
        Self {
            safety: Some(safety),
            ..Self::default()
        }
    }
}

/// Field-level merge policy: present replaces, absent preserves.
/// A present-but-empty summary still counts as present and replaces.
pub fn merge(existing: CachedRecord, patch: ProductPatch) -> CachedRecord {
    CachedRecord {
        basic: patch.basic.or(existing.basic),
        reviews: patch.reviews.or(existing.reviews),
        safety: patch.safety.or(existing.safety),
    }
}

/// In-process cache of product records, one slot per code.
#[derive(Debug, Default)]
pub struct ProductCache {
    records: HashMap<String, CachedRecord>,
}

impl ProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&CachedRecord> {
        self.records.get(code)
    }

    /// Merges a fetch result into the slot for `code`, creating the slot on
    /// first write.
    pub fn apply(&mut self, code: &str, patch: ProductPatch) {
        let existing = self.records.remove(code).unwrap_or_default();
        self.records.insert(code.to_string(), merge(existing, patch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(code: &str, name: &str) -> ProductSnapshot {
        ProductSnapshot {
            name: name.to_string(),
            brand: Some("Acme".to_string()),
            code: code.to_string(),
            image_url: None,
        }
    }

    fn reviews(summary: &str) -> ReviewSummary {
        ReviewSummary {
            summary: Some(summary.to_string()),
            sentiment: Some("positive".to_string()),
            ..ReviewSummary::default()
        }
    }

    #[test]
    fn test_merge_absent_field_preserves_existing() {
        let mut cache = ProductCache::new();
        cache.apply("123", ProductPatch::basic(ProductMatch::Found(snapshot("123", "Granola"))));
        cache.apply("123", ProductPatch::reviews(reviews("well liked")));

        let record = cache.get("123").unwrap();
        assert_eq!(
            record.basic,
            Some(ProductMatch::Found(snapshot("123", "Granola")))
        );
        assert_eq!(record.reviews.as_ref().unwrap().summary.as_deref(), Some("well liked"));
    }

    #[test]
    fn test_merge_present_field_replaces_existing() {
        let mut cache = ProductCache::new();
        cache.apply("123", ProductPatch::reviews(reviews("first")));
        cache.apply("123", ProductPatch::reviews(reviews("second")));

        let record = cache.get("123").unwrap();
        assert_eq!(record.reviews.as_ref().unwrap().summary.as_deref(), Some("second"));
    }

    #[test]
    fn test_merge_empty_summary_still_replaces() {
        let mut cache = ProductCache::new();
        cache.apply("123", ProductPatch::reviews(reviews("detailed")));
        cache.apply("123", ProductPatch::reviews(ReviewSummary::default()));

        let record = cache.get("123").unwrap();
        assert_eq!(record.reviews, Some(ReviewSummary::default()));
    }

    #[test]
    fn test_distinct_codes_never_collide() {
        let mut cache = ProductCache::new();
        cache.apply("111", ProductPatch::basic(ProductMatch::Found(snapshot("111", "Tea"))));
        cache.apply("222", ProductPatch::basic(ProductMatch::NoMatch));

        assert_eq!(
            cache.get("111").unwrap().basic,
            Some(ProductMatch::Found(snapshot("111", "Tea")))
        );
        assert_eq!(cache.get("222").unwrap().basic, Some(ProductMatch::NoMatch));
        assert!(cache.get("333").is_none());
    }

    #[test]
    fn test_no_match_is_cacheable() {
        let mut cache = ProductCache::new();
        cache.apply("404", ProductPatch::basic(ProductMatch::NoMatch));
        cache.apply("404", ProductPatch::safety(SafetyAnalysis::default()));

        let record = cache.get("404").unwrap();
        assert_eq!(record.basic, Some(ProductMatch::NoMatch));
        assert_eq!(record.safety, Some(SafetyAnalysis::default()));
    }
}

//! Lookup orchestration: one scanned code in, one settled outcome out.
//!
//! A call to [`LookupOrchestrator::lookup`] is one settlement. The history
//! upsert runs at most once per call, only for non-error settlements, and
//! always under the code the call started with; a concurrent lookup for a
//! different code cannot retarget it. Fetch errors surface to the caller and
//! leave history untouched.

use std::sync::Arc;

use tracing::info;

use crate::errors::AppError;
use crate::history::HistoryStore;
use crate::models::product::ProductSnapshot;
use crate::product_client::FetchOptions;
use crate::products::ProductService;

/// Result of one settled lookup, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    pub code: String,
    /// `None` means the lookup settled with no matching product.
    pub product: Option<ProductSnapshot>,
}

pub struct LookupOrchestrator {
    products: Arc<ProductService>,
    history: Arc<HistoryStore>,
}

impl LookupOrchestrator {
    pub fn new(products: Arc<ProductService>, history: Arc<HistoryStore>) -> Self {
        Self { products, history }
    }

    /// Resolves a scanned code (cache-first) and records the settled outcome
    /// into history. A history persistence failure is surfaced as
    /// [`AppError::Store`]; the fetched data is already merged into the
    /// response cache at that point, so the caller can still display it.
    pub async fn lookup(&self, code: &str) -> Result<LookupOutcome, AppError> {
        let product = self
            .products
            .get_product(code, &FetchOptions::default())
            .await?;

        self.history.upsert(code, product.clone()).await?;

        match &product {
            Some(found) => info!(code, name = %found.name, "lookup settled"),
            None => info!(code, "lookup settled with no match"),
        }

        Ok(LookupOutcome {
            code: code.to_string(),
            product,
        })
    }
}

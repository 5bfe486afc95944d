use std::sync::Arc;

use crate::config::Config;
use crate::history::HistoryStore;
use crate::lookup::LookupOrchestrator;
use crate::products::ProductService;

/// Shared application services, constructed once at startup and passed by
/// handle to whatever needs them: the single-instance-per-process
/// replacement for ambient context lookups.
pub struct AppState {
    pub history: Arc<HistoryStore>,
    pub products: Arc<ProductService>,
    pub lookup: LookupOrchestrator,
    pub config: Config,
}

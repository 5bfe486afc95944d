use serde::{Deserialize, Serialize};

use crate::models::product::ProductSnapshot;

/// One entry in the persisted scan history.
///
/// `observed_at` is set by the store at insert/update time, never by the
/// caller. `product: None` means the lookup completed but no product matched
/// the code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub code: String,
    /// Milliseconds since epoch.
    pub observed_at: i64,
    pub product: Option<ProductSnapshot>,
}

use thiserror::Error;

use crate::history::StoreError;
use crate::product_client::ClientError;

/// Application-level error type.
///
/// Only two conditions ever reach a caller: a failed durable write and a
/// failed backend fetch. History load errors are recovered locally (empty
/// list) and never surface, and a settled not-found is a valid outcome, not
/// an error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("fetch error: {0}")]
    Fetch(#[from] ClientError),
}

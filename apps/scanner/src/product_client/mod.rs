//! Product backend client: the single point of entry for all GraphQL calls.
//!
//! No other module talks to the backend directly. The client POSTs
//! `{query, variables}` documents, attaches a bearer token when the session
//! provides one, retries 429/5xx with exponential backoff, and decodes the
//! `{data, errors}` envelope. A settled `null` product is `Ok(None)`, never
//! an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod queries;

use crate::models::product::{ProductSnapshot, ReviewSummary, SafetyAnalysis};
use crate::session::SessionProvider;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Session error: {0}")]
    Session(String),
}

/// Options forwarded to the reviews/safety sub-resource queries.
/// `force_refresh` also bypasses the local response cache.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub force_refresh: bool,
    pub provider: Option<String>,
}

/// Read operations the product backend exposes. `Ok(None)` means the query
/// settled with no match (or a null sub-resource), a valid outcome,
/// distinct from an error.
#[async_trait]
pub trait ProductFetcher: Send + Sync {
    async fn fetch_product(&self, code: &str) -> Result<Option<ProductSnapshot>, ClientError>;

    async fn fetch_reviews(
        &self,
        code: &str,
        opts: &FetchOptions,
    ) -> Result<Option<ReviewSummary>, ClientError>;

    async fn fetch_safety(
        &self,
        code: &str,
        opts: &FetchOptions,
    ) -> Result<Option<SafetyAnalysis>, ClientError>;
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductQueryData<T> {
    product_by_upc: Option<T>,
}

/// Wire shape of the basic product selection. The backend calls the key
/// `upcCode`; everywhere else in this crate it is just `code`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProduct {
    upc_code: String,
    name: String,
    brand: Option<String>,
    image_url: Option<String>,
}

impl From<WireProduct> for ProductSnapshot {
    fn from(wire: WireProduct) -> Self {
        ProductSnapshot {
            name: wire.name,
            brand: wire.brand,
            code: wire.upc_code,
            image_url: wire.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsSelection {
    review_summary: Option<ReviewSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafetySelection {
    safety_analysis: Option<SafetyAnalysis>,
}

/// Decodes a GraphQL response body: a non-empty `errors` array wins over
/// whatever partial `data` came with it.
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let envelope: GraphQlResponse<T> = serde_json::from_str(body)?;
    if !envelope.errors.is_empty() {
        let message = envelope
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ClientError::GraphQl(message));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::GraphQl("response carried no data".to_string()))
}

/// The shared backend client used by every read path.
#[derive(Clone)]
pub struct ProductClient {
    client: Client,
    endpoint: String,
    session: Arc<dyn SessionProvider>,
}

impl ProductClient {
    pub fn new(endpoint: String, session: Arc<dyn SessionProvider>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
            session,
        }
    }

    /// Executes one query document with retry on 429/5xx.
    async fn execute<V, T>(&self, query: &'static str, variables: &V) -> Result<T, ClientError>
    where
        V: Serialize + Sync,
        T: DeserializeOwned,
    {
        let token = self
            .session
            .bearer_token()
            .await
            .map_err(|e| ClientError::Session(e.to_string()))?;

        let mut last_error: Option<ClientError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "backend call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .client
                .post(&self.endpoint)
                .json(&GraphQlRequest { query, variables });
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ClientError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("backend returned {}: {}", status, body);
                last_error = Some(ClientError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let body = response.text().await?;
            let data = decode_envelope::<T>(&body)?;
            debug!("backend call succeeded");
            return Ok(data);
        }

        Err(last_error.unwrap_or(ClientError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ProductFetcher for ProductClient {
    async fn fetch_product(&self, code: &str) -> Result<Option<ProductSnapshot>, ClientError> {
        let data: ProductQueryData<WireProduct> = self
            .execute(queries::GET_PRODUCT, &queries::CodeVariables { upc: code })
            .await?;
        Ok(data.product_by_upc.map(ProductSnapshot::from))
    }

    async fn fetch_reviews(
        &self,
        code: &str,
        opts: &FetchOptions,
    ) -> Result<Option<ReviewSummary>, ClientError> {
        let data: ProductQueryData<ReviewsSelection> = self
            .execute(
                queries::GET_PRODUCT_REVIEWS,
                &queries::SubResourceVariables {
                    upc: code,
                    force_refresh: opts.force_refresh,
                    provider: opts.provider.as_deref(),
                },
            )
            .await?;
        Ok(data.product_by_upc.and_then(|p| p.review_summary))
    }

    async fn fetch_safety(
        &self,
        code: &str,
        opts: &FetchOptions,
    ) -> Result<Option<SafetyAnalysis>, ClientError> {
        let data: ProductQueryData<SafetySelection> = self
            .execute(
                queries::GET_PRODUCT_SAFETY,
                &queries::SubResourceVariables {
                    upc: code,
                    force_refresh: opts.force_refresh,
                    provider: opts.provider.as_deref(),
                },
            )
            .await?;
        Ok(data.product_by_upc.and_then(|p| p.safety_analysis))
    }
}

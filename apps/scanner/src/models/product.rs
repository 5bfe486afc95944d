use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Basic product data returned by the primary lookup query and snapshotted
/// into history entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub name: String,
    pub brand: Option<String>,
    pub code: String,
    pub image_url: Option<String>,
}

/// AI-generated review summary for a product.
/// Every field is nullable in the backend schema, so every field is optional here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub summary: Option<String>,
    /// Overall sentiment: positive, negative, or mixed.
    pub sentiment: Option<String>,
    /// Sentiment score from 0.0 (negative) to 1.0 (positive).
    pub sentiment_score: Option<f64>,
    pub pros: Option<Vec<String>>,
    pub cons: Option<Vec<String>>,
    pub key_themes: Option<Vec<String>>,
    /// Confidence level: high, medium, or low.
    pub confidence: Option<String>,
    /// Whether the backend served this result from its own cache.
    pub cached: Option<bool>,
    pub generated_at: Option<DateTime<Utc>>,
    pub provider: Option<String>,
}

/// AI-generated safety analysis for a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnalysis {
    pub summary: Option<String>,
    /// Overall risk level: low, medium, or high.
    pub risk_level: Option<String>,
    pub allergens: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    /// Backend sends these as free-form objects, so they stay untyped JSON.
    pub harmful_ingredients: Option<Vec<Value>>,
    pub recalls: Option<Vec<Value>>,
    /// Who should avoid this product.
    pub recommendations: Option<String>,
    pub confidence: Option<String>,
    pub cached: Option<bool>,
    pub generated_at: Option<DateTime<Utc>>,
    pub provider: Option<String>,
}

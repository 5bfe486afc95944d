//! GraphQL query documents and variable types for the product backend.
//! Each read path keeps its document next to the variables it takes.

use serde::Serialize;

/// Basic product info, the lightweight query behind every scan.
pub const GET_PRODUCT: &str = "\
query GetProduct($upc: String!) {
  productByUpc(upc: $upc) {
    upcCode
    brand
    name
    imageUrl
  }
}";

/// Review summary, loaded on demand. This is the expensive AI sub-resource.
pub const GET_PRODUCT_REVIEWS: &str = "\
query GetProductReviews($upc: String!, $forceRefresh: Boolean, $provider: String) {
  productByUpc(upc: $upc) {
    upcCode
    reviewSummary(forceRefresh: $forceRefresh, provider: $provider) {
      summary
      sentiment
      sentimentScore
      pros
      cons
      keyThemes
      confidence
      cached
      generatedAt
      provider
    }
  }
}";

/// Safety analysis, loaded on demand.
pub const GET_PRODUCT_SAFETY: &str = "\
query GetProductSafety($upc: String!, $forceRefresh: Boolean, $provider: String) {
  productByUpc(upc: $upc) {
    upcCode
    safetyAnalysis(forceRefresh: $forceRefresh, provider: $provider) {
      summary
      riskLevel
      allergens
      certifications
      harmfulIngredients
      recalls
      recommendations
      confidence
      cached
      generatedAt
      provider
    }
  }
}";

#[derive(Debug, Serialize)]
pub struct CodeVariables<'a> {
    pub upc: &'a str,
}

/// Variables for the reviews/safety queries. `provider` is omitted from the
/// payload entirely when no hint was given.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubResourceVariables<'a> {
    pub upc: &'a str,
    pub force_refresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_resource_variables_serialize_camel_case() {
        let vars = SubResourceVariables {
            upc: "123",
            force_refresh: true,
            provider: Some("openai"),
        };
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"upc": "123", "forceRefresh": true, "provider": "openai"})
        );
    }

    #[test]
    fn test_absent_provider_is_omitted() {
        let vars = SubResourceVariables {
            upc: "123",
            force_refresh: false,
            provider: None,
        };
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json, serde_json::json!({"upc": "123", "forceRefresh": false}));
    }
}

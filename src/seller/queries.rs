//! GraphQL documents of the opportunity explorer and their response decoding.

use crate::error::{QueryError, QueryResult};
use crate::seller::models::{LaunchPotential, NicheCandidate, NicheDetail};
use crate::seller::transport::GraphQlRequest;
use serde_json::{json, Value};

pub const GET_NICHES_OPERATION: &str = "getNiches";
pub const GET_NICHE_DETAILS_OPERATION: &str = "getNicheWithPurchaseDrivers";

pub const GET_NICHES_QUERY: &str = r#"
query getNiches($filter: NicheFilter!, $useNewQuery: Boolean, $searchImprovementsEnabled: Boolean) {
  niches(
    filter: $filter
    useNewQuery: $useNewQuery
    searchImprovementsEnabled: $searchImprovementsEnabled
  ) {
    nicheId
    obfuscatedMarketplaceId
    nicheTitle
    nicheSummary {
      searchVolumeT360
      searchVolumeGrowthT180
      maximumAverageUnitsSoldT360
      avgPriceT360
      __typename
    }
    __typename
  }
}"#;

pub const GET_NICHE_DETAILS_QUERY: &str = r#"
query getNicheWithPurchaseDrivers($nicheInput: NicheInput!) {
  niche(request: $nicheInput) {
    launchPotential {
      avgReviewCount { currentValue }
      newProductsLaunchedT360 { currentValue }
      successfulLaunchesT360 { currentValue }
    }
  }
}"#;

/// Builds the keyword search request for one marketplace.
pub fn niches_request(keyword: &str, marketplace_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        query: GET_NICHES_QUERY.to_string(),
        operation_name: GET_NICHES_OPERATION.to_string(),
        variables: json!({
            "filter": {
                "obfuscatedMarketplaceId": marketplace_id,
                "rangeFilters": [],
                "multiSelectFilters": [],
                "searchTermsFilter": { "searchInput": keyword },
            },
            "useNewQuery": true,
            "searchImprovementsEnabled": true,
        }),
    }
}

/// Builds the launch-potential request for one niche.
pub fn niche_detail_request(niche_id: &str, marketplace_id: &str) -> GraphQlRequest {
    GraphQlRequest {
        query: GET_NICHE_DETAILS_QUERY.to_string(),
        operation_name: GET_NICHE_DETAILS_OPERATION.to_string(),
        variables: json!({
            "nicheInput": {
                "nicheId": niche_id,
                "obfuscatedMarketplaceId": marketplace_id,
            },
        }),
    }
}

/// Extracts `data.niches`; a missing or null list means no candidates.
pub fn parse_niches(payload: &Value) -> QueryResult<Vec<NicheCandidate>> {
    match payload.pointer("/data/niches") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                serde_json::from_value(item.clone())
                    .map_err(|e| QueryError::Decode(format!("niche entry: {}", e)))
            })
            .collect(),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => Err(QueryError::Decode(format!("expected niches array, got {}", other))),
    }
}

/// Extracts `data.niche.launchPotential`; `None` when the niche has no launch data.
pub fn parse_niche_detail(payload: &Value) -> QueryResult<Option<NicheDetail>> {
    match payload.pointer("/data/niche/launchPotential") {
        Some(value @ Value::Object(_)) => {
            let raw: LaunchPotential = serde_json::from_value(value.clone())
                .map_err(|e| QueryError::Decode(format!("launchPotential: {}", e)))?;
            Ok(Some(raw.into()))
        }
        _ => Ok(None),
    }
}

//! Address suggestion and detail endpoints.

use axum::Json;
use axum::extract::{Query, State};
use kasira_domain::{RegionLevel, RegionSelector};
use serde::Deserialize;

use crate::dto::{DetailRequest, DetailResponse, SuggestResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Minimum query length before the provider is consulted; shorter
/// inputs answer with an empty list.
const MIN_QUERY_CHARS: usize = 3;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub q: String,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub postal: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn region_from_query(query: &SuggestQuery) -> RegionSelector {
    let level = |name: &Option<String>| {
        name.as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| RegionLevel {
                id: name.to_owned(),
                name: name.to_owned(),
            })
    };

    RegionSelector {
        province: level(&query.province),
        city: level(&query.city),
        district: level(&query.district),
        village: level(&query.village),
        postal_code: query
            .postal
            .as_deref()
            .map(str::trim)
            .filter(|postal| !postal.is_empty())
            .map(ToOwned::to_owned),
    }
}

pub async fn suggest_handler(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> ApiResult<Json<SuggestResponse>> {
    let stats = || state.geocoder_stats.snapshot().into();

    if query.q.trim().len() < MIN_QUERY_CHARS {
        return Ok(Json(SuggestResponse {
            success: true,
            items: Vec::new(),
            stale: false,
            stats: stats(),
        }));
    }

    let region = region_from_query(&query);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let bias = state.address_search_service.region_bias(&region).await;

    let items = state
        .address_search_service
        .suggest_latest(query.q.trim(), &region, limit, bias)
        .await;
    let stale = items.is_none();

    Ok(Json(SuggestResponse {
        success: true,
        items: items.unwrap_or_default(),
        stale,
        stats: stats(),
    }))
}

pub async fn detail_handler(
    State(state): State<AppState>,
    Json(request): Json<DetailRequest>,
) -> ApiResult<Json<DetailResponse>> {
    let detail = state
        .address_detail_service
        .resolve(&request.item, &request.typed_text)
        .await;

    Ok(Json(DetailResponse {
        success: true,
        detail,
    }))
}

//! Candidate-driven address search orchestration.
//!
//! Turns partial free-text input plus a selected administrative region
//! into a ranked suggestion list: each candidate is tried bare and then
//! with postal, city and province augmentations, the first variant the
//! provider answers wins,
//! and the raw rows then pass through region filtering and
//! province-priority re-ranking. Provider failures degrade to an empty
//! list so the caller always has a defined state to render.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kasira_domain::{
    RegionSelector, SuggestItem, build_candidates, extract_postal5, filter_by_region,
    prioritize_by_province,
};

use crate::{ForwardGeocoder, GeoPoint, SearchSequence};

/// Application service producing address suggestions.
pub struct AddressSearchService {
    geocoder: Arc<dyn ForwardGeocoder>,
    sequence: SearchSequence,
    bias_cache: Mutex<HashMap<String, Option<GeoPoint>>>,
}

impl AddressSearchService {
    /// Creates a search service over a forward geocoder.
    #[must_use]
    pub fn new(geocoder: Arc<dyn ForwardGeocoder>) -> Self {
        Self {
            geocoder,
            sequence: SearchSequence::new(),
            bias_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a bias coordinate for the region by forward-searching
    /// the most specific level with a name: village, then district,
    /// then city, then province.
    ///
    /// Outcomes are cached per region, including unresolvable ones, so
    /// repeated keystrokes in the same region cost no provider calls;
    /// the region has to change before the provider is asked again.
    pub async fn region_bias(&self, region: &RegionSelector) -> Option<GeoPoint> {
        let seeds = [
            region.village_name(),
            region.district_name(),
            region.city_name(),
            region.province_name(),
        ];

        let key = seeds
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join("\u{1f}");
        if key.is_empty() {
            return None;
        }
        if let Ok(cache) = self.bias_cache.lock() {
            if let Some(bias) = cache.get(&key) {
                return *bias;
            }
        }

        let mut resolved = None;
        for seed in seeds.into_iter().flatten() {
            let rows = self.search_or_empty(seed, 1, None).await;
            if let Some(item) = rows.first() {
                resolved = Some(GeoPoint {
                    lat: item.lat,
                    lon: item.lon,
                });
                break;
            }
        }

        if let Ok(mut cache) = self.bias_cache.lock() {
            cache.insert(key, resolved);
        }
        resolved
    }

    /// Runs the candidate ladder and returns filtered, re-ranked
    /// suggestions for the input text.
    pub async fn suggest(
        &self,
        text: &str,
        region: &RegionSelector,
        limit: usize,
        bias: Option<GeoPoint>,
    ) -> Vec<SuggestItem> {
        let postal = region.postal_code.as_deref().and_then(extract_postal5);

        for candidate in build_candidates(text) {
            let mut queries = vec![candidate.clone()];
            if let Some(postal) = postal.as_deref() {
                push_unique(&mut queries, format!("{candidate}, {postal}"));
            }
            push_unique(
                &mut queries,
                join_query(&candidate, region.city_name(), postal.as_deref()),
            );
            push_unique(
                &mut queries,
                join_query(&candidate, region.province_name(), postal.as_deref()),
            );

            for query in &queries {
                let rows = self.search_or_empty(query, limit, bias).await;
                if !rows.is_empty() {
                    return finish(rows, region);
                }
            }
        }

        Vec::new()
    }

    /// Like [`Self::suggest`], but sequenced: returns `None` when a
    /// newer search was issued while this one ran, so stale responses
    /// are dropped instead of overwriting fresh ones.
    pub async fn suggest_latest(
        &self,
        text: &str,
        region: &RegionSelector,
        limit: usize,
        bias: Option<GeoPoint>,
    ) -> Option<Vec<SuggestItem>> {
        let ticket = self.sequence.begin();
        let rows = self.suggest(text, region, limit, bias).await;
        self.sequence.is_current(ticket).then_some(rows)
    }

    async fn search_or_empty(
        &self,
        query: &str,
        limit: usize,
        bias: Option<GeoPoint>,
    ) -> Vec<SuggestItem> {
        self.geocoder
            .search(query, limit, bias)
            .await
            .unwrap_or_default()
    }
}

fn push_unique(queries: &mut Vec<String>, query: String) {
    if !queries.contains(&query) {
        queries.push(query);
    }
}

fn join_query(candidate: &str, region_name: Option<&str>, postal: Option<&str>) -> String {
    let mut parts = vec![candidate];
    parts.extend(region_name);
    parts.extend(postal);
    parts.join(", ")
}

fn finish(rows: Vec<SuggestItem>, region: &RegionSelector) -> Vec<SuggestItem> {
    prioritize_by_province(filter_by_region(rows, region), region)
}

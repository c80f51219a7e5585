//! Photon-backed forward geocoder.
//!
//! Queries are suffixed with the country name, bounded to the
//! Indonesian bounding box, and paced through the shared throttle.
//! Every call is recorded in the shared diagnostics, including the
//! final request URL.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use kasira_application::{ForwardGeocoder, GeoPoint, GeocoderStats, SearchThrottle};
use kasira_core::{AppError, AppResult};
use kasira_domain::SuggestItem;
use serde_json::{Map, Value};

/// Lon/lat bounding box covering the Indonesian archipelago.
const INDONESIA_BBOX: &str = "95,-11,141,6";

/// ISO country code results are filtered to, when the provider tags it.
const COUNTRY_CODE: &str = "ID";

/// Forward geocoder over the Photon HTTP API.
pub struct PhotonGeocoder {
    client: reqwest::Client,
    base_url: String,
    throttle: Arc<SearchThrottle>,
    stats: Arc<GeocoderStats>,
}

impl PhotonGeocoder {
    /// Creates a geocoder against a Photon base URL, e.g.
    /// `https://photon.komoot.io`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        throttle: Arc<SearchThrottle>,
        stats: Arc<GeocoderStats>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            throttle,
            stats,
        }
    }

    async fn execute(&self, request: reqwest::Request) -> AppResult<Value> {
        let url = request.url().to_string();
        let started = Instant::now();

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                self.stats
                    .record_error(&error.to_string(), elapsed_ms(started), &url);
                return Err(AppError::Internal(format!(
                    "photon request failed: {error}"
                )));
            }
        };

        let status = response.status();
        self.stats
            .record_status(status.as_u16(), elapsed_ms(started), &url);
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "photon returned an error status");
            return Err(AppError::Internal(format!(
                "photon returned status {status}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| AppError::Internal(format!("photon response was not JSON: {error}")))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn feature_to_item(feature: &Value) -> Option<SuggestItem> {
    let props = feature.get("properties")?.as_object()?;
    let coordinates = feature.get("geometry")?.get("coordinates")?.as_array()?;
    let lon = coordinates.first()?.as_f64()?;
    let lat = coordinates.get(1)?.as_f64()?;

    Some(SuggestItem {
        label: build_label(props),
        lat,
        lon,
        raw: props.clone(),
    })
}

fn prop_str<'a>(props: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn first_prop<'a>(props: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| prop_str(props, key))
}

/// Assembles a display label from the property bag, most specific part
/// first, skipping duplicate parts.
fn build_label(props: &Map<String, Value>) -> String {
    let street = match (prop_str(props, "street"), prop_str(props, "housenumber")) {
        (Some(street), Some(number)) => Some(format!("{street} {number}")),
        (Some(street), None) => Some(street.to_owned()),
        (None, _) => None,
    };

    let parts = [
        prop_str(props, "name").map(ToOwned::to_owned),
        street,
        first_prop(
            props,
            &["suburb", "neighbourhood", "village", "hamlet", "quarter", "locality", "ward"],
        )
        .map(ToOwned::to_owned),
        first_prop(props, &["city", "town", "municipality", "county"]).map(ToOwned::to_owned),
        first_prop(props, &["district", "city_district", "subdistrict"]).map(ToOwned::to_owned),
        prop_str(props, "state").map(ToOwned::to_owned),
        prop_str(props, "postcode").map(ToOwned::to_owned),
    ];

    let mut label: Vec<String> = Vec::new();
    for part in parts.into_iter().flatten() {
        if !label.iter().any(|existing| existing.eq_ignore_ascii_case(&part)) {
            label.push(part);
        }
    }
    label.join(", ")
}

fn in_country(item: &SuggestItem) -> bool {
    item.raw_str("countrycode")
        .is_some_and(|code| code.eq_ignore_ascii_case(COUNTRY_CODE))
}

#[async_trait]
impl ForwardGeocoder for PhotonGeocoder {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        bias: Option<GeoPoint>,
    ) -> AppResult<Vec<SuggestItem>> {
        self.throttle.pace().await;

        let mut request = self.client.get(format!("{}/api", self.base_url)).query(&[
            ("q", format!("{query}, Indonesia")),
            ("lang", "en".to_owned()),
            ("limit", limit.to_string()),
            ("bbox", INDONESIA_BBOX.to_owned()),
        ]);
        if let Some(bias) = bias {
            request = request.query(&[
                ("lat", bias.lat.to_string()),
                ("lon", bias.lon.to_string()),
            ]);
        }
        let request = request
            .build()
            .map_err(|error| AppError::Internal(format!("invalid photon request: {error}")))?;

        let body = self.execute(request).await?;
        let items: Vec<SuggestItem> = body
            .get("features")
            .and_then(Value::as_array)
            .map(|features| features.iter().filter_map(feature_to_item).collect())
            .unwrap_or_default();

        // The bbox is advisory upstream, so re-check the country tag;
        // untagged result sets pass through unchanged.
        let tagged: Vec<SuggestItem> = items.iter().filter(|item| in_country(item)).cloned().collect();
        if tagged.is_empty() {
            Ok(items)
        } else {
            Ok(tagged)
        }
    }

    async fn reverse(&self, lat: f64, lon: f64) -> AppResult<Map<String, Value>> {
        self.throttle.pace().await;

        let request = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("lang", "en".to_owned()),
            ])
            .build()
            .map_err(|error| AppError::Internal(format!("invalid photon request: {error}")))?;

        let body = self.execute(request).await?;
        Ok(body
            .get("features")
            .and_then(Value::as_array)
            .and_then(|features| features.first())
            .and_then(|feature| feature.get("properties"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_label, feature_to_item};

    fn props(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn label_orders_specific_to_general_and_dedupes() {
        let label = build_label(&props(json!({
            "name": "Joglo",
            "street": "Jalan Joglo Raya",
            "housenumber": "12",
            "suburb": "Joglo",
            "city": "Jakarta Barat",
            "state": "DKI Jakarta",
            "postcode": "11640",
        })));
        assert_eq!(
            label,
            "Joglo, Jalan Joglo Raya 12, Jakarta Barat, DKI Jakarta, 11640"
        );
    }

    #[test]
    fn label_skips_blank_fields() {
        let label = build_label(&props(json!({
            "name": "  ",
            "city": "Jakarta Barat",
        })));
        assert_eq!(label, "Jakarta Barat");
    }

    #[test]
    fn feature_extracts_lon_lat_order() {
        let item = feature_to_item(&json!({
            "properties": { "name": "Joglo" },
            "geometry": { "coordinates": [106.75, -6.22] },
        }));
        let item = match item {
            Some(item) => item,
            None => panic!("feature should map"),
        };
        assert_eq!(item.lon, 106.75);
        assert_eq!(item.lat, -6.22);
        assert_eq!(item.label, "Joglo");
    }

    #[test]
    fn malformed_features_are_dropped() {
        assert!(feature_to_item(&json!({ "properties": {} })).is_none());
    }
}

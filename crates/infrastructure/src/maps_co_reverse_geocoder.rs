//! Detailed reverse geocoder over the geocode.maps.co Nominatim proxy.
//!
//! Used as the second stage of address detail resolution: its
//! `addressdetails` breakdown carries administrative levels (and
//! occasionally RT/RW tags) that the forward provider omits. Field
//! names are translated into the same vocabulary the forward provider
//! uses so one property-bag mapper serves both.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use kasira_application::{DetailReverseGeocoder, GeocoderStats, SearchThrottle};
use kasira_core::{AppError, AppResult};
use serde_json::{Map, Value};

/// Detail reverse geocoder over the geocode.maps.co HTTP API.
pub struct MapsCoReverseGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    throttle: Arc<SearchThrottle>,
    stats: Arc<GeocoderStats>,
}

impl MapsCoReverseGeocoder {
    /// Creates a geocoder against a base URL, e.g.
    /// `https://geocode.maps.co`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        throttle: Arc<SearchThrottle>,
        stats: Arc<GeocoderStats>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            throttle,
            stats,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn address_str<'a>(address: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        address
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    })
}

/// Translates a Nominatim `address` object (plus the top-level labels)
/// into the forward provider's property vocabulary.
fn translate_response(body: &Value) -> Map<String, Value> {
    let empty = Map::new();
    let address = body
        .get("address")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let fields: [(&str, &[&str]); 9] = [
        ("street", &["road", "residential", "pedestrian", "path"]),
        ("housenumber", &["house_number"]),
        (
            "suburb",
            &["suburb", "neighbourhood", "village", "hamlet", "quarter"],
        ),
        ("district", &["city_district", "district", "subdistrict"]),
        ("city", &["city", "town", "municipality", "county"]),
        ("state", &["state", "region", "state_district"]),
        ("postcode", &["postcode"]),
        ("rt", &["rt", "addr:rt"]),
        ("rw", &["rw", "addr:rw"]),
    ];

    let mut props = Map::new();
    for (target, sources) in fields {
        if let Some(value) = address_str(address, sources) {
            props.insert(target.to_owned(), Value::String(value.to_owned()));
        }
    }
    for key in ["display_name", "name"] {
        if let Some(value) = body.get(key).and_then(Value::as_str) {
            if !value.is_empty() {
                props.insert(key.to_owned(), Value::String(value.to_owned()));
            }
        }
    }
    props
}

#[async_trait]
impl DetailReverseGeocoder for MapsCoReverseGeocoder {
    async fn reverse(&self, lat: f64, lon: f64) -> AppResult<Map<String, Value>> {
        self.throttle.pace().await;

        let mut request = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "jsonv2".to_owned()),
                ("addressdetails", "1".to_owned()),
                ("zoom", "18".to_owned()),
            ]);
        if let Some(api_key) = self.api_key.as_deref() {
            request = request.query(&[("api_key", api_key)]);
        }
        let request = request
            .build()
            .map_err(|error| AppError::Internal(format!("invalid reverse request: {error}")))?;

        let url = request.url().to_string();
        let started = Instant::now();
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                self.stats
                    .record_error(&error.to_string(), elapsed_ms(started), &url);
                return Err(AppError::Internal(format!(
                    "reverse geocode failed: {error}"
                )));
            }
        };

        let status = response.status();
        self.stats
            .record_status(status.as_u16(), elapsed_ms(started), &url);
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "reverse geocoder returned an error status");
            return Err(AppError::Internal(format!(
                "reverse geocode returned status {status}"
            )));
        }

        let body = response.json::<Value>().await.map_err(|error| {
            AppError::Internal(format!("reverse geocode response was not JSON: {error}"))
        })?;
        Ok(translate_response(&body))
    }
}

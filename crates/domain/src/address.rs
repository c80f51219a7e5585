//! Address domain types and provider property-bag normalization.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One level of the administrative hierarchy, as selected in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLevel {
    /// Region id from the upstream region dataset.
    pub id: String,
    /// Human-readable region name used for matching.
    pub name: String,
}

/// Hierarchical locality filter for address searches.
///
/// Every level is optional; more specific levels narrow results. The
/// postal code, when present, filters strictly (exact 5-digit match),
/// unlike the name-based levels which fall back on empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSelector {
    /// Province (provinsi) level.
    #[serde(default)]
    pub province: Option<RegionLevel>,
    /// City or regency (kota/kabupaten) level.
    #[serde(default)]
    pub city: Option<RegionLevel>,
    /// District (kecamatan) level.
    #[serde(default)]
    pub district: Option<RegionLevel>,
    /// Village (kelurahan) level. Not a filter step; seeds the search
    /// bias when selected.
    #[serde(default)]
    pub village: Option<RegionLevel>,
    /// Strict 5-digit postal code filter.
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl RegionSelector {
    /// Returns the province name, when one is selected.
    #[must_use]
    pub fn province_name(&self) -> Option<&str> {
        self.province.as_ref().map(|level| level.name.as_str())
    }

    /// Returns the city name, when one is selected.
    #[must_use]
    pub fn city_name(&self) -> Option<&str> {
        self.city.as_ref().map(|level| level.name.as_str())
    }

    /// Returns the district name, when one is selected.
    #[must_use]
    pub fn district_name(&self) -> Option<&str> {
        self.district.as_ref().map(|level| level.name.as_str())
    }

    /// Returns the village name, when one is selected.
    #[must_use]
    pub fn village_name(&self) -> Option<&str> {
        self.village.as_ref().map(|level| level.name.as_str())
    }
}

/// One geocoding search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestItem {
    /// Display label assembled by the provider adapter.
    pub label: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Raw provider property bag, kept for filtering and detail mapping.
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl SuggestItem {
    /// Returns a non-empty string property from the raw bag.
    #[must_use]
    pub fn raw_str(&self, key: &str) -> Option<&str> {
        self.raw
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Normalized address record built from a selected result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetail {
    /// Street plus house number, when known.
    pub street: Option<String>,
    /// Village (kelurahan).
    pub village: Option<String>,
    /// District (kecamatan).
    pub district: Option<String>,
    /// City or regency.
    pub city: Option<String>,
    /// Province.
    pub province: Option<String>,
    /// 5-digit postal code.
    pub postal_code: Option<String>,
    /// Neighborhood unit (RT).
    pub rt: Option<String>,
    /// Community unit (RW).
    pub rw: Option<String>,
}

impl AddressDetail {
    /// Returns whether every field is absent or empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.street,
            &self.village,
            &self.district,
            &self.city,
            &self.province,
            &self.postal_code,
            &self.rt,
            &self.rw,
        ]
        .into_iter()
        .all(|field| field.as_deref().is_none_or(str::is_empty))
    }

    /// Fills every empty field from `other`, never overwriting a
    /// populated one.
    pub fn merge_missing_from(&mut self, other: &AddressDetail) {
        merge_field(&mut self.street, &other.street);
        merge_field(&mut self.village, &other.village);
        merge_field(&mut self.district, &other.district);
        merge_field(&mut self.city, &other.city);
        merge_field(&mut self.province, &other.province);
        merge_field(&mut self.postal_code, &other.postal_code);
        merge_field(&mut self.rt, &other.rt);
        merge_field(&mut self.rw, &other.rw);
    }
}

fn merge_field(target: &mut Option<String>, source: &Option<String>) {
    if target.as_deref().is_none_or(str::is_empty) {
        if let Some(value) = source.as_deref().filter(|value| !value.is_empty()) {
            *target = Some(value.to_owned());
        }
    }
}

static LOCALITY_LOOKS_LIKE_RT_RW: LazyLock<Regex> =
    LazyLock::new(|| crate::address_text::compile(r"(?i)\br\s*t\b|\br\s*w\b"));

fn prop_str<'a>(props: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn first_prop(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| prop_str(props, key))
        .map(ToOwned::to_owned)
}

/// Maps a provider property bag into a normalized address record.
///
/// Providers disagree on field names, so each target field reads an
/// ordered preference chain. A `locality` value that itself looks like an
/// RT/RW token is not promoted to the village field.
#[must_use]
pub fn map_props_to_address(props: &Map<String, Value>) -> AddressDetail {
    let locality = prop_str(props, "locality").unwrap_or_default();
    let locality_is_rt_rw = LOCALITY_LOOKS_LIKE_RT_RW.is_match(locality);

    let mut village = first_prop(
        props,
        &["suburb", "neighbourhood", "village", "hamlet", "quarter", "ward"],
    );
    if village.is_none() && !locality_is_rt_rw && !locality.is_empty() {
        village = Some(locality.to_owned());
    }

    let street_parts: Vec<&str> = ["street", "housenumber"]
        .iter()
        .filter_map(|key| prop_str(props, key))
        .collect();
    let street = if street_parts.is_empty() {
        first_prop(props, &["name"])
    } else {
        Some(street_parts.join(" "))
    };

    AddressDetail {
        street,
        village,
        district: first_prop(props, &["district", "city_district", "subdistrict"]),
        city: first_prop(props, &["city", "town", "municipality", "county"]),
        province: first_prop(props, &["state", "region", "state_district"]),
        postal_code: first_prop(props, &["postcode"]),
        rt: first_prop(props, &["rt", "addr:rt"]),
        rw: first_prop(props, &["rw", "addr:rw"]),
    }
}

//! Normalization of a selected suggestion into structured address fields.
//!
//! Resolution is staged: the picked result's own property bag first, a
//! coarse reverse-geocode when that bag is empty, then a detailed
//! secondary reverse-geocode merged field-by-field without ever
//! overwriting what earlier stages produced. RT/RW units are regex
//! backfilled from every text the user or the providers gave us.

use std::sync::Arc;

use kasira_domain::{
    AddressDetail, SuggestItem, enrich_rt_rw, map_props_to_address, village_from_label,
};
use serde_json::{Map, Value};

use crate::{DetailReverseGeocoder, ForwardGeocoder};

/// Application service turning a picked suggestion into an
/// [`AddressDetail`].
pub struct AddressDetailService {
    geocoder: Arc<dyn ForwardGeocoder>,
    detail_geocoder: Arc<dyn DetailReverseGeocoder>,
}

impl AddressDetailService {
    /// Creates a detail service over the two reverse-geocoding ports.
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn ForwardGeocoder>,
        detail_geocoder: Arc<dyn DetailReverseGeocoder>,
    ) -> Self {
        Self {
            geocoder,
            detail_geocoder,
        }
    }

    /// Resolves the normalized address for a picked suggestion.
    ///
    /// `typed_text` is the raw text the user had typed; it participates
    /// in the RT/RW backfill after the label.
    pub async fn resolve(&self, item: &SuggestItem, typed_text: &str) -> AddressDetail {
        let mut detail = map_props_to_address(&item.raw);

        if detail.is_empty() {
            let props = self
                .geocoder
                .reverse(item.lat, item.lon)
                .await
                .unwrap_or_default();
            detail = map_props_to_address(&props);
        }

        if has_missing_key_fields(&detail) {
            let props = self
                .detail_geocoder
                .reverse(item.lat, item.lon)
                .await
                .unwrap_or_default();
            if !props.is_empty() {
                detail.merge_missing_from(&map_props_to_address(&props));
                detail = enrich_rt_rw(
                    detail,
                    [prop_str(&props, "display_name"), prop_str(&props, "name")],
                );
            }
        }

        detail = enrich_rt_rw(
            detail,
            [
                Some(item.label.as_str()),
                Some(typed_text),
                item.raw_str("name"),
                item.raw_str("locality"),
                item.raw_str("street"),
            ],
        );

        if detail.village.as_deref().is_none_or(str::is_empty) {
            detail.village = village_from_label(&item.label);
        }

        detail
    }
}

fn has_missing_key_fields(detail: &AddressDetail) -> bool {
    [
        &detail.village,
        &detail.district,
        &detail.city,
        &detail.postal_code,
        &detail.rt,
        &detail.rw,
    ]
    .into_iter()
    .any(|field| field.as_deref().is_none_or(str::is_empty))
}

fn prop_str<'a>(props: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests;

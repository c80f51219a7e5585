use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use kasira_core::{AppError, AppResult};
use kasira_domain::SuggestItem;
use serde_json::{Map, Value, json};

use super::AddressDetailService;
use crate::{DetailReverseGeocoder, ForwardGeocoder, GeoPoint};

#[derive(Default)]
struct FakeForwardGeocoder {
    reverse_props: Map<String, Value>,
    reverse_calls: AtomicU64,
}

#[async_trait]
impl ForwardGeocoder for FakeForwardGeocoder {
    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _bias: Option<GeoPoint>,
    ) -> AppResult<Vec<SuggestItem>> {
        Ok(Vec::new())
    }

    async fn reverse(&self, _lat: f64, _lon: f64) -> AppResult<Map<String, Value>> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reverse_props.clone())
    }
}

#[derive(Default)]
struct FakeDetailGeocoder {
    props: Map<String, Value>,
    fail: bool,
    calls: AtomicU64,
}

#[async_trait]
impl DetailReverseGeocoder for FakeDetailGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> AppResult<Map<String, Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Internal("provider unavailable".to_owned()));
        }
        Ok(self.props.clone())
    }
}

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn item(label: &str, raw: Value) -> SuggestItem {
    SuggestItem {
        label: label.to_owned(),
        lat: -6.2,
        lon: 106.7,
        raw: props(raw),
    }
}

fn service(
    forward: FakeForwardGeocoder,
    detail: FakeDetailGeocoder,
) -> (
    AddressDetailService,
    Arc<FakeForwardGeocoder>,
    Arc<FakeDetailGeocoder>,
) {
    let forward = Arc::new(forward);
    let detail = Arc::new(detail);
    (
        AddressDetailService::new(forward.clone(), detail.clone()),
        forward,
        detail,
    )
}

#[tokio::test]
async fn complete_property_bag_skips_both_reverse_lookups() {
    let (service, forward, detail_geocoder) = service(
        FakeForwardGeocoder::default(),
        FakeDetailGeocoder::default(),
    );
    let picked = item(
        "Jalan Joglo Raya, Joglo, Kembangan, Jakarta Barat, 11640",
        json!({
            "street": "Jalan Joglo Raya",
            "suburb": "Joglo",
            "district": "Kembangan",
            "city": "Jakarta Barat",
            "state": "DKI Jakarta",
            "postcode": "11640",
            "rt": "4",
            "rw": "8",
        }),
    );

    let detail = service.resolve(&picked, "jalan joglo").await;

    assert_eq!(detail.street.as_deref(), Some("Jalan Joglo Raya"));
    assert_eq!(detail.village.as_deref(), Some("Joglo"));
    assert_eq!(forward.reverse_calls.load(Ordering::SeqCst), 0);
    assert_eq!(detail_geocoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_property_bag_falls_back_to_coarse_reverse() {
    let (service, forward, _) = service(
        FakeForwardGeocoder {
            reverse_props: props(json!({
                "street": "Jalan Joglo Raya",
                "suburb": "Joglo",
                "district": "Kembangan",
                "city": "Jakarta Barat",
                "postcode": "11640",
                "rt": "4",
                "rw": "8",
            })),
            ..FakeForwardGeocoder::default()
        },
        FakeDetailGeocoder::default(),
    );
    let picked = item("Somewhere", json!({}));

    let detail = service.resolve(&picked, "").await;

    assert_eq!(detail.street.as_deref(), Some("Jalan Joglo Raya"));
    assert_eq!(detail.city.as_deref(), Some("Jakarta Barat"));
    assert_eq!(forward.reverse_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn detailed_reverse_fills_gaps_without_overwriting() {
    let (service, _, detail_geocoder) = service(
        FakeForwardGeocoder::default(),
        FakeDetailGeocoder {
            props: props(json!({
                "city": "Bekasi",
                "district": "Kembangan",
                "postcode": "11640",
                "display_name": "Jalan Joglo Raya, RT 04/RW 08, Joglo, Jakarta Barat",
            })),
            ..FakeDetailGeocoder::default()
        },
    );
    let picked = item(
        "Jalan Joglo Raya, Jakarta Barat",
        json!({
            "street": "Jalan Joglo Raya",
            "suburb": "Joglo",
            "city": "Jakarta Barat",
        }),
    );

    let detail = service.resolve(&picked, "jalan joglo").await;

    assert_eq!(detail_geocoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(detail.city.as_deref(), Some("Jakarta Barat"));
    assert_eq!(detail.district.as_deref(), Some("Kembangan"));
    assert_eq!(detail.postal_code.as_deref(), Some("11640"));
    assert_eq!(detail.rt.as_deref(), Some("4"));
    assert_eq!(detail.rw.as_deref(), Some("8"));
}

#[tokio::test]
async fn detailed_reverse_failure_is_not_fatal() {
    let (service, _, _) = service(
        FakeForwardGeocoder::default(),
        FakeDetailGeocoder {
            fail: true,
            ..FakeDetailGeocoder::default()
        },
    );
    let picked = item(
        "Jalan Joglo Raya, Jakarta Barat",
        json!({ "street": "Jalan Joglo Raya" }),
    );

    let detail = service.resolve(&picked, "jalan joglo").await;
    assert_eq!(detail.street.as_deref(), Some("Jalan Joglo Raya"));
}

#[tokio::test]
async fn rt_rw_backfills_from_typed_text() {
    let (service, _, _) = service(
        FakeForwardGeocoder::default(),
        FakeDetailGeocoder::default(),
    );
    let picked = item(
        "Jalan Joglo Raya, Jakarta Barat",
        json!({ "street": "Jalan Joglo Raya" }),
    );

    let detail = service.resolve(&picked, "jl joglo raya rt 04 rw 08").await;

    assert_eq!(detail.rt.as_deref(), Some("4"));
    assert_eq!(detail.rw.as_deref(), Some("8"));
}

#[tokio::test]
async fn village_falls_back_to_a_label_segment() {
    let (service, _, _) = service(
        FakeForwardGeocoder::default(),
        FakeDetailGeocoder::default(),
    );
    let picked = item(
        "Jalan Joglo Raya, Joglo, Kembangan, Jakarta Barat",
        json!({ "street": "Jalan Joglo Raya" }),
    );

    let detail = service.resolve(&picked, "").await;
    assert_eq!(detail.village.as_deref(), Some("Joglo"));
}

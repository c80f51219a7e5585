//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod json_fixture_store;
mod maps_co_reverse_geocoder;
mod photon_geocoder;

pub use json_fixture_store::JsonFixtureStore;
pub use maps_co_reverse_geocoder::MapsCoReverseGeocoder;
pub use photon_geocoder::PhotonGeocoder;

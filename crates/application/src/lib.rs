//! Application services and ports.

#![forbid(unsafe_code)]

mod address_detail_service;
mod address_search_service;
mod directory_ports;
mod directory_service;
mod geocoding_ports;
mod permission_service;
mod suggestion_flow;

pub use address_detail_service::AddressDetailService;
pub use address_search_service::AddressSearchService;
pub use directory_ports::{PermissionDirectory, UserDirectory};
pub use directory_service::{CompanyRoleRow, CompanyUserRow, DirectoryService};
pub use geocoding_ports::{
    DetailReverseGeocoder, ForwardGeocoder, GeoPoint, GeocoderStats, GeocoderStatsSnapshot,
    SearchSequence, SearchThrottle,
};
pub use permission_service::PermissionService;
pub use suggestion_flow::SuggestionFlow;

use std::sync::Arc;

use kasira_application::{
    AddressDetailService, AddressSearchService, DirectoryService, GeocoderStats,
    PermissionService, UserDirectory,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_service: Arc<PermissionService>,
    pub directory_service: Arc<DirectoryService>,
    pub address_search_service: Arc<AddressSearchService>,
    pub address_detail_service: Arc<AddressDetailService>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub geocoder_stats: Arc<GeocoderStats>,
    pub frontend_url: String,
}

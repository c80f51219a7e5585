//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod address;
mod address_text;
mod directory;
mod permission;

pub use address::{
    AddressDetail, RegionLevel, RegionSelector, SuggestItem, map_props_to_address,
};
pub use address_text::{
    build_candidates, city_cores, enrich_rt_rw, extract_postal5, extract_rt_rw, filter_by_region,
    item_in_city, item_in_district, item_in_province, item_postal5, normalize_admin,
    prioritize_by_province, village_from_label,
};
pub use directory::{Company, Membership, RoleAssignment, RolePermissions, User};
pub use permission::{normalize_permission, permission_module, permission_set_allows};

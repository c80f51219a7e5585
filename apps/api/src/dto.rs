//! Request and response payloads.

use std::collections::BTreeMap;

use kasira_application::{CompanyRoleRow, CompanyUserRow, GeocoderStatsSnapshot};
use kasira_core::UserIdentity;
use kasira_domain::{AddressDetail, SuggestItem, User};
use serde::{Deserialize, Serialize};

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signed-in user payload.
#[derive(Debug, Serialize)]
pub struct UserIdentityResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl UserIdentityResponse {
    pub fn from_identity(identity: &UserIdentity) -> Self {
        Self {
            id: identity.subject().to_owned(),
            name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
        }
    }
}

/// Builds the session identity stored for a signed-in user.
pub fn identity_for_user(user: &User) -> UserIdentity {
    UserIdentity::new(
        user.id.clone(),
        user.full_name.clone().unwrap_or_else(|| user.email.clone()),
        Some(user.email.clone()),
    )
}

/// Capability-check response envelope.
///
/// `success` is false for unauthenticated or malformed calls;
/// permission denials are reported per capability inside `caps`.
#[derive(Debug, Serialize)]
pub struct CapsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caps: Option<BTreeMap<String, bool>>,
}

impl CapsResponse {
    pub fn granted(caps: BTreeMap<String, bool>) -> Self {
        Self {
            success: true,
            caps: Some(caps),
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            caps: None,
        }
    }
}

/// Employee listing response.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub company_id: String,
    pub users: Vec<CompanyUserRow>,
}

/// Role listing response.
#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub success: bool,
    pub company_id: String,
    pub roles: Vec<CompanyRoleRow>,
}

/// Address suggestion response.
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub success: bool,
    pub items: Vec<SuggestItem>,
    /// True when this response lost the race to a newer query and its
    /// items were discarded.
    pub stale: bool,
    pub stats: GeocoderStatsView,
}

/// Provider diagnostics rendered alongside suggestions.
#[derive(Debug, Serialize)]
pub struct GeocoderStatsView {
    pub hits: u64,
    pub last_status: Option<u16>,
    pub last_ms: Option<u64>,
    pub rate_limited: bool,
    pub last_error: Option<String>,
}

impl From<GeocoderStatsSnapshot> for GeocoderStatsView {
    fn from(snapshot: GeocoderStatsSnapshot) -> Self {
        Self {
            hits: snapshot.hits,
            last_status: snapshot.last_status,
            last_ms: snapshot.last_ms,
            rate_limited: snapshot.rate_limited,
            last_error: snapshot.last_error,
        }
    }
}

/// Address detail request body: the picked suggestion plus the text
/// the user had typed.
#[derive(Debug, Deserialize)]
pub struct DetailRequest {
    pub item: SuggestItem,
    #[serde(default)]
    pub typed_text: String,
}

/// Address detail response.
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub success: bool,
    pub detail: AddressDetail,
}

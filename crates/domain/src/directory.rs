//! Read-only reference rows loaded from the fixture files.
//!
//! These records stand in for a database: they are deserialized once at
//! process start and never mutated. Identifiers are opaque strings taken
//! verbatim from the fixtures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A company (tenant) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Stable company id.
    pub id: String,
    /// URL-friendly short name.
    pub slug: String,
    /// Owning user, when the company has one. At most one owner per
    /// company by convention; nothing enforces it structurally.
    #[serde(default)]
    pub owner_user_id: Option<String>,
    /// Whether the company is active. Absent in older fixtures.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A user's association with a company.
///
/// Uniqueness of the `(company_id, user_id)` pair is not enforced;
/// lookups use first-match semantics over the fixture order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Company the membership belongs to.
    pub company_id: String,
    /// Member user id.
    pub user_id: String,
    /// Owner flag; grants every permission inside the company.
    pub is_owner: bool,
    /// Inactive memberships are ignored by the resolver.
    pub is_active: bool,
    /// When the user joined, when the fixture records it.
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

/// Maps a role code to the permission strings it carries.
///
/// Role codes and permission strings are matched case-insensitively and
/// whitespace-trimmed; see [`crate::normalize_permission`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    /// Role code, e.g. `admin` or `cashier`.
    pub role_code: String,
    /// Permission strings of the form `<module>:<action>` or `<module>:*`.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// The set of role codes a user holds inside one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Company scope of the assignment.
    pub company_id: String,
    /// Assigned user id.
    pub user_id: String,
    /// Role codes held in that company.
    #[serde(default)]
    pub role_codes: Vec<String>,
}

/// A sign-in capable user record.
///
/// The fixture stores the literal credential; the fixtures stand in for an
/// identity provider and there is no write path that could hash anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Sign-in email, compared trimmed and lowercased.
    pub email: String,
    /// Fixture credential.
    pub password: String,
    /// Inactive users still resolve permissions but are flagged in the
    /// directory rows.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Account creation timestamp, when the fixture records it.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

//! Permission string handling.
//!
//! Permission strings have the form `<module>:<action>`, with `<module>:*`
//! acting as a wildcard over every action in the module. Matching is
//! case-insensitive and whitespace-trimmed on both sides, for role codes
//! and permission strings alike.

use std::collections::BTreeSet;

/// Normalizes a role code or permission string for comparison.
#[must_use]
pub fn normalize_permission(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Returns the module prefix of a normalized permission string.
#[must_use]
pub fn permission_module(permission: &str) -> &str {
    permission.split(':').next().unwrap_or(permission)
}

/// Returns whether a resolved permission set grants the permission,
/// either literally or through its module wildcard.
///
/// Both the set entries and `permission` must already be normalized.
#[must_use]
pub fn permission_set_allows(permissions: &BTreeSet<String>, permission: &str) -> bool {
    if permissions.contains(permission) {
        return true;
    }

    let wildcard = format!("{}:*", permission_module(permission));
    permissions.contains(&wildcard)
}

//! RBAC permission resolution.
//!
//! Decisions layer ownership over membership over role grants:
//! company owners always pass, owner-flagged memberships always pass,
//! everyone else resolves through role-to-permission maps with module
//! wildcard support. Every invalid or missing input resolves to a denial;
//! the resolver never surfaces an authorization failure as an error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use kasira_core::AppResult;
use kasira_domain::{Membership, normalize_permission, permission_set_allows};

use crate::PermissionDirectory;

/// Application service answering permission checks against the
/// read-only reference tables.
#[derive(Clone)]
pub struct PermissionService {
    directory: Arc<dyn PermissionDirectory>,
}

impl PermissionService {
    /// Creates a permission service from a directory implementation.
    #[must_use]
    pub fn new(directory: Arc<dyn PermissionDirectory>) -> Self {
        Self { directory }
    }

    /// Global (union) permission check, without a company context.
    ///
    /// A user owning any company passes every check; this mirrors the
    /// product's single-operator deployment and is intentionally broader
    /// than [`Self::has_permission_in_company`], which callers should
    /// prefer whenever a company context is known.
    pub async fn has_permission(&self, user_id: &str, permission: &str) -> AppResult<bool> {
        if user_id.trim().is_empty() || permission.trim().is_empty() {
            return Ok(false);
        }

        let wanted = normalize_permission(permission);

        let companies = self.directory.companies().await?;
        if companies
            .iter()
            .any(|company| company.owner_user_id.as_deref() == Some(user_id))
        {
            return Ok(true);
        }

        let memberships: Vec<Membership> = self
            .directory
            .memberships_for_user(user_id)
            .await?
            .into_iter()
            .filter(|membership| membership.is_active)
            .collect();
        if memberships.is_empty() {
            return Ok(false);
        }
        if memberships.iter().any(|membership| membership.is_owner) {
            return Ok(true);
        }

        let mut codes = BTreeSet::new();
        for membership in &memberships {
            if let Some(assignment) = self
                .directory
                .find_role_assignment(&membership.company_id, user_id)
                .await?
            {
                for code in assignment.role_codes {
                    codes.insert(normalize_permission(&code));
                }
            }
        }
        if codes.is_empty() {
            return Ok(false);
        }

        let permissions = self.union_role_permissions(&codes).await?;
        Ok(permission_set_allows(&permissions, &wanted))
    }

    /// Company-scoped permission check; the least-privilege form used
    /// for UI capability gating.
    pub async fn has_permission_in_company(
        &self,
        user_id: &str,
        company_id: &str,
        permission: &str,
    ) -> AppResult<bool> {
        if user_id.trim().is_empty()
            || company_id.trim().is_empty()
            || permission.trim().is_empty()
        {
            return Ok(false);
        }

        let wanted = normalize_permission(permission);

        let Some(company) = self.directory.find_company(company_id).await? else {
            return Ok(false);
        };
        if company.owner_user_id.as_deref() == Some(user_id) {
            return Ok(true);
        }

        let Some(membership) = self
            .directory
            .find_active_membership(company_id, user_id)
            .await?
        else {
            return Ok(false);
        };
        if membership.is_owner {
            return Ok(true);
        }

        let codes: BTreeSet<String> = self
            .directory
            .find_role_assignment(company_id, user_id)
            .await?
            .map(|assignment| {
                assignment
                    .role_codes
                    .iter()
                    .map(|code| normalize_permission(code))
                    .collect()
            })
            .unwrap_or_default();
        if codes.is_empty() {
            return Ok(false);
        }

        let permissions = self.union_role_permissions(&codes).await?;
        Ok(permission_set_allows(&permissions, &wanted))
    }

    /// Returns whether the user may view a module (`<module>:view`).
    pub async fn has_view(&self, user_id: &str, module: &str) -> AppResult<bool> {
        self.has_permission(user_id, &format!("{module}:view")).await
    }

    /// Route-guard form of [`Self::has_view`]. The path is accepted for
    /// call-site symmetry but ignored: view guards are global.
    pub async fn has_view_for_path(
        &self,
        user_id: &str,
        _path: &str,
        module: &str,
    ) -> AppResult<bool> {
        self.has_view(user_id, module).await
    }

    /// Resolves a capability map for a module and a set of actions,
    /// keyed by the full `<module>:<action>` string. Uses the scoped
    /// check when a company id is given, the global one otherwise.
    pub async fn caps_for(
        &self,
        user_id: &str,
        module: &str,
        actions: &[String],
        company_id: Option<&str>,
    ) -> AppResult<BTreeMap<String, bool>> {
        let mut caps = BTreeMap::new();

        for action in actions {
            let permission = format!("{module}:{action}");
            let granted = match company_id {
                Some(company_id) => {
                    self.has_permission_in_company(user_id, company_id, &permission)
                        .await?
                }
                None => self.has_permission(user_id, &permission).await?,
            };
            caps.insert(permission, granted);
        }

        Ok(caps)
    }

    async fn union_role_permissions(
        &self,
        codes: &BTreeSet<String>,
    ) -> AppResult<BTreeSet<String>> {
        let mut permissions = BTreeSet::new();
        for code in codes {
            for permission in self.directory.permissions_for_role(code).await? {
                permissions.insert(normalize_permission(&permission));
            }
        }

        Ok(permissions)
    }
}

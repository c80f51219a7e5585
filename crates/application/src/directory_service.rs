//! Company directory listings for the back-office tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kasira_core::AppResult;
use kasira_domain::normalize_permission;
use serde::Serialize;

use crate::{PermissionDirectory, UserDirectory};

/// One row of the employees table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyUserRow {
    /// User id.
    pub id: String,
    /// Display name, `-` when the record has none.
    pub name: String,
    /// Sign-in email, `-` when the record has none.
    pub email: String,
    /// Role codes held in this company, fixture order.
    pub roles: Vec<String>,
    /// Whether the membership carries the owner flag.
    pub is_owner: bool,
    /// Active when both the user and the membership are active; a
    /// membership whose user record is missing counts as active.
    pub is_active: bool,
    /// Join date, falling back to the account creation date.
    pub joined_at: Option<DateTime<Utc>>,
}

/// One row of the roles table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRoleRow {
    /// Role code.
    pub code: String,
    /// Normalized permission strings the role carries.
    pub permissions: Vec<String>,
    /// How many of the company's members hold the role.
    pub member_count: usize,
}

/// Read-model service backing the employees and roles pages.
pub struct DirectoryService {
    permissions: Arc<dyn PermissionDirectory>,
    users: Arc<dyn UserDirectory>,
}

impl DirectoryService {
    /// Creates a directory service over the two read ports.
    #[must_use]
    pub fn new(permissions: Arc<dyn PermissionDirectory>, users: Arc<dyn UserDirectory>) -> Self {
        Self { permissions, users }
    }

    /// Picks the company a signed-in user lands in: the first active
    /// company they own, else the company of their first active
    /// membership.
    pub async fn default_company_id(&self, user_id: &str) -> AppResult<Option<String>> {
        let owned = self
            .permissions
            .companies()
            .await?
            .into_iter()
            .find(|company| {
                company.is_active && company.owner_user_id.as_deref() == Some(user_id)
            });
        if let Some(company) = owned {
            return Ok(Some(company.id));
        }

        Ok(self
            .permissions
            .memberships_for_user(user_id)
            .await?
            .into_iter()
            .find(|membership| membership.is_active)
            .map(|membership| membership.company_id))
    }

    /// Lists the members of a company with their roles and status.
    pub async fn company_users(&self, company_id: &str) -> AppResult<Vec<CompanyUserRow>> {
        let memberships = self.permissions.memberships_for_company(company_id).await?;

        let mut rows = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let user = self.users.find_user(&membership.user_id).await?;
            let roles = self
                .permissions
                .find_role_assignment(company_id, &membership.user_id)
                .await?
                .map(|assignment| assignment.role_codes)
                .unwrap_or_default();

            let (name, email, user_active, created_at) = match user {
                Some(user) => (
                    user.full_name.unwrap_or_else(|| "-".to_owned()),
                    user.email,
                    user.is_active,
                    user.created_at,
                ),
                None => ("-".to_owned(), "-".to_owned(), true, None),
            };

            rows.push(CompanyUserRow {
                id: membership.user_id,
                name,
                email,
                roles,
                is_owner: membership.is_owner,
                is_active: user_active && membership.is_active,
                joined_at: membership.joined_at.or(created_at),
            });
        }

        Ok(rows)
    }

    /// Lists a company's roles with their permissions and how many
    /// members hold each, sorted by role code.
    pub async fn company_roles(&self, company_id: &str) -> AppResult<Vec<CompanyRoleRow>> {
        let assignments = self
            .permissions
            .role_assignments_for_company(company_id)
            .await?;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for assignment in &assignments {
            for code in &assignment.role_codes {
                *counts.entry(normalize_permission(code)).or_default() += 1;
            }
        }

        let mut rows = Vec::with_capacity(counts.len());
        for (code, member_count) in counts {
            let permissions = self
                .permissions
                .permissions_for_role(&code)
                .await?
                .iter()
                .map(|permission| normalize_permission(permission))
                .collect();
            rows.push(CompanyRoleRow {
                code,
                permissions,
                member_count,
            });
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests;

//! Fixture-file backed implementation of the directory ports.
//!
//! The five reference tables are plain JSON arrays loaded once at
//! startup and served from memory. There is no write path; the store
//! stands in for a database during demos and tests.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use kasira_application::{PermissionDirectory, UserDirectory};
use kasira_core::{AppError, AppResult};
use kasira_domain::{
    Company, Membership, RoleAssignment, RolePermissions, User, normalize_permission,
};
use serde::de::DeserializeOwned;

/// In-memory directory loaded from JSON fixture files.
pub struct JsonFixtureStore {
    companies: Vec<Company>,
    memberships: Vec<Membership>,
    role_permissions: Vec<RolePermissions>,
    role_assignments: Vec<RoleAssignment>,
    users: Vec<User>,
}

fn load_table<T: DeserializeOwned>(dir: &Path, file_name: &str) -> AppResult<Vec<T>> {
    let path = dir.join(file_name);
    let raw = fs::read_to_string(&path).map_err(|error| {
        AppError::Internal(format!("failed to read {}: {error}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        AppError::Internal(format!("failed to parse {}: {error}", path.display()))
    })
}

impl JsonFixtureStore {
    /// Loads every table from a fixture directory.
    pub fn load(dir: &Path) -> AppResult<Self> {
        let store = Self {
            companies: load_table(dir, "companies.json")?,
            memberships: load_table(dir, "memberships.json")?,
            role_permissions: load_table(dir, "role-perm.json")?,
            role_assignments: load_table(dir, "user-roles.json")?,
            users: load_table(dir, "users.json")?,
        };
        tracing::info!(
            companies = store.companies.len(),
            memberships = store.memberships.len(),
            roles = store.role_permissions.len(),
            assignments = store.role_assignments.len(),
            users = store.users.len(),
            "loaded directory fixtures"
        );
        Ok(store)
    }

    /// Builds a store from already-deserialized rows.
    #[must_use]
    pub fn from_records(
        companies: Vec<Company>,
        memberships: Vec<Membership>,
        role_permissions: Vec<RolePermissions>,
        role_assignments: Vec<RoleAssignment>,
        users: Vec<User>,
    ) -> Self {
        Self {
            companies,
            memberships,
            role_permissions,
            role_assignments,
            users,
        }
    }
}

#[async_trait]
impl PermissionDirectory for JsonFixtureStore {
    async fn companies(&self) -> AppResult<Vec<Company>> {
        Ok(self.companies.clone())
    }

    async fn find_company(&self, company_id: &str) -> AppResult<Option<Company>> {
        Ok(self
            .companies
            .iter()
            .find(|company| company.id == company_id)
            .cloned())
    }

    async fn memberships_for_user(&self, user_id: &str) -> AppResult<Vec<Membership>> {
        Ok(self
            .memberships
            .iter()
            .filter(|membership| membership.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn memberships_for_company(&self, company_id: &str) -> AppResult<Vec<Membership>> {
        Ok(self
            .memberships
            .iter()
            .filter(|membership| membership.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn find_active_membership(
        &self,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Membership>> {
        Ok(self
            .memberships
            .iter()
            .find(|membership| {
                membership.company_id == company_id
                    && membership.user_id == user_id
                    && membership.is_active
            })
            .cloned())
    }

    async fn find_role_assignment(
        &self,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .role_assignments
            .iter()
            .find(|assignment| {
                assignment.company_id == company_id && assignment.user_id == user_id
            })
            .cloned())
    }

    async fn role_assignments_for_company(
        &self,
        company_id: &str,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .role_assignments
            .iter()
            .filter(|assignment| assignment.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn permissions_for_role(&self, role_code: &str) -> AppResult<Vec<String>> {
        let wanted = normalize_permission(role_code);
        Ok(self
            .role_permissions
            .iter()
            .find(|map| normalize_permission(&map.role_code) == wanted)
            .map(|map| map.permissions.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for JsonFixtureStore {
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .iter()
            .find(|user| user.email.trim().to_lowercase() == email && user.password == password)
            .cloned())
    }

    async fn find_user(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.iter().find(|user| user.id == user_id).cloned())
    }
}

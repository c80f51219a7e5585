//! Repository ports over the read-only reference tables.

use async_trait::async_trait;
use kasira_core::AppResult;
use kasira_domain::{Company, Membership, RoleAssignment, User};

/// Read port for the permission reference tables.
///
/// Implementations expose the fixture rows as loaded; the services apply
/// normalization and precedence rules. Where the underlying data could
/// hold duplicate `(company, user)` rows, `find_*` methods return the
/// first match in storage order.
#[async_trait]
pub trait PermissionDirectory: Send + Sync {
    /// Lists every company.
    async fn companies(&self) -> AppResult<Vec<Company>>;

    /// Finds a company by id.
    async fn find_company(&self, company_id: &str) -> AppResult<Option<Company>>;

    /// Lists a user's memberships across all companies.
    async fn memberships_for_user(&self, user_id: &str) -> AppResult<Vec<Membership>>;

    /// Lists every membership of one company.
    async fn memberships_for_company(&self, company_id: &str) -> AppResult<Vec<Membership>>;

    /// Finds the first active membership for a `(company, user)` pair.
    async fn find_active_membership(
        &self,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Membership>>;

    /// Finds the first role assignment for a `(company, user)` pair.
    async fn find_role_assignment(
        &self,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Lists every role assignment inside one company.
    async fn role_assignments_for_company(
        &self,
        company_id: &str,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Returns the permission strings mapped to a role code. The code is
    /// matched case-insensitively and whitespace-trimmed.
    async fn permissions_for_role(&self, role_code: &str) -> AppResult<Vec<String>>;
}

/// Read port for the sign-in user table.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds the user matching the credentials, comparing the email
    /// trimmed and lowercased. Returns `None` on any mismatch.
    async fn find_by_credentials(&self, email: &str, password: &str)
    -> AppResult<Option<User>>;

    /// Finds a user by id.
    async fn find_user(&self, user_id: &str) -> AppResult<Option<User>>;
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use kasira_core::AppResult;
use kasira_domain::{
    Company, Membership, RoleAssignment, RolePermissions, User, normalize_permission,
};

use super::DirectoryService;
use crate::{PermissionDirectory, UserDirectory};

#[derive(Default)]
struct FakeDirectory {
    companies: Vec<Company>,
    memberships: Vec<Membership>,
    role_permissions: Vec<RolePermissions>,
    role_assignments: Vec<RoleAssignment>,
    users: Vec<User>,
}

#[async_trait]
impl PermissionDirectory for FakeDirectory {
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
        Ok(self
            .role_permissions
            .iter()
            .find(|map| normalize_permission(&map.role_code) == normalize_permission(role_code))
            .map(|map| map.permissions.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
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

fn company(id: &str, owner: Option<&str>, is_active: bool) -> Company {
    Company {
        id: id.to_owned(),
        slug: id.to_owned(),
        owner_user_id: owner.map(ToOwned::to_owned),
        is_active,
    }
}

fn membership(company_id: &str, user_id: &str, is_owner: bool, is_active: bool) -> Membership {
    Membership {
        company_id: company_id.to_owned(),
        user_id: user_id.to_owned(),
        is_owner,
        is_active,
        joined_at: None,
    }
}

fn user(id: &str, name: Option<&str>, is_active: bool) -> User {
    User {
        id: id.to_owned(),
        full_name: name.map(ToOwned::to_owned),
        email: format!("{id}@kasira.test"),
        password: "rahasia".to_owned(),
        is_active,
        created_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).single().unwrap_or_default()),
    }
}

fn assignment(company_id: &str, user_id: &str, codes: &[&str]) -> RoleAssignment {
    RoleAssignment {
        company_id: company_id.to_owned(),
        user_id: user_id.to_owned(),
        role_codes: codes.iter().map(|code| (*code).to_owned()).collect(),
    }
}

fn service(directory: FakeDirectory) -> DirectoryService {
    let directory = Arc::new(directory);
    DirectoryService::new(directory.clone(), directory)
}

#[tokio::test]
async fn default_company_prefers_an_active_owned_company() {
    let service = service(FakeDirectory {
        companies: vec![
            company("dormant", Some("u1"), false),
            company("mine", Some("u1"), true),
        ],
        memberships: vec![membership("other", "u1", false, true)],
        ..FakeDirectory::default()
    });

    assert!(matches!(
        service.default_company_id("u1").await,
        Ok(Some(id)) if id == "mine"
    ));
}

#[tokio::test]
async fn default_company_falls_back_to_the_first_active_membership() {
    let service = service(FakeDirectory {
        companies: vec![company("c1", Some("someone-else"), true)],
        memberships: vec![
            membership("c1", "u2", false, false),
            membership("c2", "u2", false, true),
        ],
        ..FakeDirectory::default()
    });

    assert!(matches!(
        service.default_company_id("u2").await,
        Ok(Some(id)) if id == "c2"
    ));
}

#[tokio::test]
async fn users_rows_join_roles_and_compose_active_status() {
    let service = service(FakeDirectory {
        memberships: vec![
            membership("c1", "u1", true, true),
            membership("c1", "u2", false, true),
            membership("c1", "u3", false, true),
        ],
        role_assignments: vec![assignment("c1", "u2", &["cashier", "supervisor"])],
        users: vec![
            user("u1", Some("Ayu Lestari"), true),
            user("u2", None, false),
            user("u3", Some("Budi Santoso"), true),
        ],
        ..FakeDirectory::default()
    });

    let rows = match service.company_users("c1").await {
        Ok(rows) => rows,
        Err(error) => panic!("company_users failed: {error}"),
    };

    assert_eq!(rows.len(), 3);
    assert!(rows[0].is_owner);
    assert_eq!(rows[1].name, "-");
    assert_eq!(rows[1].roles, vec!["cashier", "supervisor"]);
    assert!(!rows[1].is_active);
    assert!(rows[2].roles.is_empty());
    // Join date falls back to the account creation date.
    assert!(rows[2].joined_at.is_some());
}

#[tokio::test]
async fn users_rows_survive_a_missing_user_record() {
    let service = service(FakeDirectory {
        memberships: vec![
            membership("c1", "ghost", false, true),
            membership("c1", "gone", false, false),
        ],
        ..FakeDirectory::default()
    });

    let rows = match service.company_users("c1").await {
        Ok(rows) => rows,
        Err(error) => panic!("company_users failed: {error}"),
    };
    assert_eq!(rows[0].name, "-");
    assert_eq!(rows[0].email, "-");
    // A missing user record does not deactivate the row; only the
    // membership flag decides.
    assert!(rows[0].is_active);
    assert!(!rows[1].is_active);
}

#[tokio::test]
async fn roles_rows_count_members_and_normalize_codes() {
    let service = service(FakeDirectory {
        role_permissions: vec![RolePermissions {
            role_code: "Cashier".to_owned(),
            permissions: vec![" Orders:View ".to_owned(), "orders:create".to_owned()],
        }],
        role_assignments: vec![
            assignment("c1", "u1", &["CASHIER"]),
            assignment("c1", "u2", &["cashier", "supervisor"]),
            assignment("c2", "u3", &["cashier"]),
        ],
        ..FakeDirectory::default()
    });

    let rows = match service.company_roles("c1").await {
        Ok(rows) => rows,
        Err(error) => panic!("company_roles failed: {error}"),
    };

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].code, "cashier");
    assert_eq!(rows[0].member_count, 2);
    assert_eq!(rows[0].permissions, vec!["orders:view", "orders:create"]);
    assert_eq!(rows[1].code, "supervisor");
    assert_eq!(rows[1].member_count, 1);
    assert!(rows[1].permissions.is_empty());
}

//! Company directory listings for the signed-in user's company.

use axum::Extension;
use axum::Json;
use axum::extract::State;
use kasira_core::{AppError, UserIdentity};

use crate::dto::{RolesResponse, UsersResponse};
use crate::error::ApiResult;
use crate::state::AppState;

async fn company_for(state: &AppState, identity: &UserIdentity) -> ApiResult<String> {
    state
        .directory_service
        .default_company_id(identity.subject())
        .await?
        .ok_or_else(|| AppError::NotFound("user belongs to no active company".to_owned()).into())
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<UsersResponse>> {
    let company_id = company_for(&state, &identity).await?;
    let users = state.directory_service.company_users(&company_id).await?;
    Ok(Json(UsersResponse {
        success: true,
        company_id,
        users,
    }))
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<RolesResponse>> {
    let company_id = company_for(&state, &identity).await?;
    let roles = state.directory_service.company_roles(&company_id).await?;
    Ok(Json(RolesResponse {
        success: true,
        company_id,
        roles,
    }))
}

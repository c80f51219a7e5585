//! Session-based sign-in against the fixture user table.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use kasira_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{LoginRequest, UserIdentityResponse, identity_for_user};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let user = state
        .user_directory
        .find_by_credentials(&request.email, &request.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid email or password".to_owned()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("account is disabled".to_owned()).into());
    }

    let identity = identity_for_user(&user);
    session
        .insert(SESSION_USER_KEY, identity.clone())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    tracing::info!(subject = identity.subject(), "user signed in");
    Ok(Json(UserIdentityResponse::from_identity(&identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(UserIdentityResponse::from_identity(&identity)))
}

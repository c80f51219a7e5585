//! Capability checks for the front-end permission gate.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kasira_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::dto::CapsResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Parsed `/api/perm/caps` query string.
#[derive(Debug, PartialEq, Eq)]
pub struct CapsQuery {
    pub module: String,
    pub actions: Vec<String>,
    pub company_id: Option<String>,
}

/// Parses the caps query pairs: one `module`, one or more repeated
/// `action` keys, and an optional `company_id`.
pub fn parse_caps_query(pairs: &[(String, String)]) -> Result<CapsQuery, AppError> {
    let value_of = |key: &str| {
        pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    };

    let module = value_of("module")
        .ok_or_else(|| AppError::Validation("missing query parameter 'module'".to_owned()))?
        .to_owned();

    let actions: Vec<String> = pairs
        .iter()
        .filter(|(name, _)| name == "action")
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect();
    if actions.is_empty() {
        return Err(AppError::Validation(
            "at least one 'action' query parameter is required".to_owned(),
        ));
    }

    Ok(CapsQuery {
        module,
        actions,
        company_id: value_of("company_id").map(ToOwned::to_owned),
    })
}

/// Resolves the requested capabilities for the signed-in user.
///
/// Failures answer with the `{"success": false}` envelope instead of
/// the generic error payload: 401 when unauthenticated, 400 when the
/// query is malformed. The front-end gate branches on the status.
pub async fn caps_handler(
    State(state): State<AppState>,
    session: Session,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let identity = match session.get::<UserIdentity>(SESSION_USER_KEY).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            return (StatusCode::UNAUTHORIZED, Json(CapsResponse::failure())).into_response();
        }
        Err(error) => {
            return ApiError(AppError::Internal(format!(
                "failed to read session identity: {error}"
            )))
            .into_response();
        }
    };

    let Ok(query) = parse_caps_query(&pairs) else {
        return (StatusCode::BAD_REQUEST, Json(CapsResponse::failure())).into_response();
    };

    match state
        .permission_service
        .caps_for(
            identity.subject(),
            &query.module,
            &query.actions,
            query.company_id.as_deref(),
        )
        .await
    {
        Ok(caps) => Json(CapsResponse::granted(caps)).into_response(),
        Err(error) => ApiError(error).into_response(),
    }
}

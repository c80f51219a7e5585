use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use kasira_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// How a rule combines its module view requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Any listed module view grants access.
    Any,
    /// Every listed module view is required.
    All,
}

/// A navigation gate: the exact request path and the module views it
/// requires.
pub struct ViewRule {
    pub path: &'static str,
    pub modules: &'static [&'static str],
    pub mode: ViewMode,
}

/// Exact-path gates for the guarded read endpoints. Paths without a
/// rule pass through on authentication alone.
pub const VIEW_RULES: &[ViewRule] = &[
    ViewRule {
        path: "/api/users",
        modules: &["employees"],
        mode: ViewMode::Any,
    },
    ViewRule {
        path: "/api/roles",
        modules: &["roles"],
        mode: ViewMode::Any,
    },
];

pub fn rule_for_path(path: &str) -> Option<&'static ViewRule> {
    VIEW_RULES.iter().find(|rule| rule.path == path)
}

/// Denies the request with 403 unless the signed-in user holds the view
/// permissions the path's rule names.
pub async fn require_view(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(rule) = rule_for_path(request.uri().path()) else {
        return Ok(next.run(request).await);
    };

    let identity = request
        .extensions()
        .get::<UserIdentity>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let mut granted = Vec::with_capacity(rule.modules.len());
    for module in rule.modules {
        granted.push(
            state
                .permission_service
                .has_view(identity.subject(), module)
                .await?,
        );
    }

    let allowed = match rule.mode {
        ViewMode::Any => granted.iter().any(|ok| *ok),
        ViewMode::All => granted.iter().all(|ok| *ok),
    };
    if !allowed {
        return Err(AppError::Forbidden(format!(
            "missing view permission for {}",
            request.uri().path()
        ))
        .into());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::{ViewMode, rule_for_path};

    #[test]
    fn rules_match_exact_paths_only() {
        assert!(rule_for_path("/api/users").is_some());
        assert!(rule_for_path("/api/users/42").is_none());
        assert!(rule_for_path("/api/geo/suggest").is_none());
    }

    #[test]
    fn users_rule_requires_the_employees_module() {
        let rule = match rule_for_path("/api/users") {
            Some(rule) => rule,
            None => panic!("missing rule"),
        };
        assert_eq!(rule.modules, ["employees"]);
        assert_eq!(rule.mode, ViewMode::Any);
    }
}

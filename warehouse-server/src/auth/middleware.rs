//! Authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Paths under `/api/` reachable without a token
fn is_public_api_route(path: &str) -> bool {
    path == "/api/auth/login" || path.starts_with("/api/clock/")
}

/// Require a valid `Authorization: Bearer <token>` header
///
/// On success the [`CurrentUser`] is inserted into request extensions.
///
/// Skipped for:
/// - `OPTIONS *` (CORS preflight)
/// - paths outside `/api/` (health, static files)
/// - `/api/auth/login` and the kiosk `/api/clock/*` routes
///
/// | Failure              | Error                    |
/// |----------------------|--------------------------|
/// | No header            | 401 NotAuthenticated     |
/// | Expired token        | 401 TokenExpired         |
/// | Any other bad token  | 401 TokenInvalid         |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS
        || !path.starts_with("/api/")
        || is_public_api_route(path)
    {
        return Ok(next.run(req).await);
    }

    let user = authenticate(&state, req.headers(), req.uri())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Validate the bearer token in `headers`
pub(crate) fn authenticate(
    state: &ServerState,
    headers: &http::HeaderMap,
    uri: &http::Uri,
) -> Result<CurrentUser, AppError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = uri.path().to_string());
            return Err(AppError::not_authenticated());
        }
    };

    let claims = state.get_jwt_service().validate_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.to_string(),
            uri = uri.path().to_string()
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed token claims: {e}")))
}

/// Fail unless the caller is a supervisor or leader
pub fn ensure_super(user: &CurrentUser, action: &str) -> Result<(), AppError> {
    if user.is_super() {
        return Ok(());
    }
    security_log!(
        "WARN",
        "super_role_required",
        user_id = user.id,
        username = user.username.as_str(),
        role = user.role.as_str(),
        action = action
    );
    Err(AppError::new(ErrorCode::SuperRoleRequired))
}

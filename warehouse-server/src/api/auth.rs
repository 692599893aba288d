//! Authentication routes
//!
//! | Path             | Method | Auth                 |
//! |------------------|--------|----------------------|
//! | /api/auth/login  | POST   | none, rate limited   |
//! | /api/auth/me     | GET    | bearer token         |

use axum::{
    Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use shared::client::{CurrentUserResponse, LoginRequest, LoginResponse};
use shared::error::{AppError, AppResult};

use super::extract::Json;
use crate::auth::password::verify_password;
use crate::auth::{CurrentUser, login_rate_limit};
use crate::core::ServerState;
use crate::db::users;
use crate::security_log;

/// The login rate limiter needs state, so it is attached here
pub fn router(state: &ServerState) -> Router<ServerState> {
    let login = Router::new()
        .route("/api/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    Router::new()
        .route("/api/auth/me", get(me))
        .merge(login)
}

/// Exchange username and password for a token
///
/// Unknown usernames and wrong passwords get the same 401.
async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = users::find_by_username(state.pool(), &req.username).await?;

    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        security_log!(
            "WARN",
            "login_failed",
            username = req.username.as_str()
        );
        return Err(AppError::invalid_credentials());
    };

    let role = user
        .role()
        .ok_or_else(|| AppError::internal(format!("User {} has unknown role {}", user.id, user.role)))?;
    let token = state
        .get_jwt_service()
        .generate_token(user.id, &user.username, role)
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_log!(
        "INFO",
        "login_success",
        user_id = user.id,
        username = user.username.as_str()
    );

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: role.as_str().to_string(),
    }))
}

async fn me(user: CurrentUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user_id: user.id,
        username: user.username,
        role: user.role.as_str().to_string(),
    })
}

//! User account management
//!
//! | Path                      | Method | Who                                  |
//! |---------------------------|--------|--------------------------------------|
//! | /api/users                | GET    | supervisor, leader                   |
//! | /api/users                | POST   | supervisor, leader                   |
//! | /api/users/{id}/password  | PUT    | self (with current password) or super |
//! | /api/users/{id}/role      | PUT    | supervisor, leader                   |
//! | /api/users/{id}           | DELETE | supervisor, leader, never self       |

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
};
use shared::client::{ChangePasswordRequest, ChangeRoleRequest, CreateUserRequest, MessageResponse};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Role, User, UserResponse};

use super::extract::{Json, Path};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{CurrentUser, ensure_super};
use crate::core::ServerState;
use crate::db::{RepoError, users};
use crate::security_log;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/{id}", delete(remove))
        .route("/api/users/{id}/password", put(change_password))
        .route("/api/users/{id}/role", put(change_role))
}

fn parse_role(raw: &str) -> AppResult<Role> {
    raw.parse::<Role>()
        .map_err(|e| AppError::with_message(ErrorCode::UnknownRole, e.to_string()))
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

async fn find_user(state: &ServerState, id: i64) -> AppResult<User> {
    users::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))
}

async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    ensure_super(&current, "list_users")?;
    let users = users::list(state.pool()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    ensure_super(&current, "create_user")?;

    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() || req.role.is_empty() {
        return Err(AppError::validation("username, password and role are required"));
    }
    let role = parse_role(&req.role)?;

    let user = users::create(state.pool(), username, &hash(&req.password)?, role)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::UsernameExists),
            other => other.into(),
        })?;

    security_log!(
        "INFO",
        "user_created",
        by = current.username.as_str(),
        username = user.username.as_str(),
        role = role.as_str()
    );
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Own password needs the current one; others' passwords need a super role
async fn change_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if req.new_password.is_empty() {
        return Err(AppError::validation("new_password is required"));
    }
    let target = find_user(&state, id).await?;

    if target.id == current.id {
        let current_password = req
            .current_password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("current_password is required"))?;
        if !verify_password(current_password, &target.password_hash) {
            security_log!(
                "WARN",
                "password_change_rejected",
                user_id = current.id,
                username = current.username.as_str()
            );
            return Err(AppError::new(ErrorCode::CurrentPasswordMismatch));
        }
    } else {
        ensure_super(&current, "change_password")?;
    }

    users::update_password(state.pool(), target.id, &hash(&req.new_password)?).await?;
    security_log!(
        "INFO",
        "password_changed",
        by = current.username.as_str(),
        username = target.username.as_str()
    );
    Ok(Json(MessageResponse::new("Password changed")))
}

async fn change_role(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ChangeRoleRequest>,
) -> AppResult<Json<MessageResponse>> {
    ensure_super(&current, "change_role")?;
    let role = parse_role(&req.role)?;
    let target = find_user(&state, id).await?;

    users::update_role(state.pool(), target.id, role).await?;
    security_log!(
        "INFO",
        "role_changed",
        by = current.username.as_str(),
        username = target.username.as_str(),
        role = role.as_str()
    );
    Ok(Json(MessageResponse::new("Role changed")))
}

async fn remove(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    ensure_super(&current, "delete_user")?;
    let target = find_user(&state, id).await?;
    if target.id == current.id {
        return Err(AppError::new(ErrorCode::CannotDeleteSelf));
    }

    users::delete(state.pool(), target.id).await?;
    security_log!(
        "INFO",
        "user_deleted",
        by = current.username.as_str(),
        username = target.username.as_str()
    );
    Ok(Json(MessageResponse::new("User deleted")))
}

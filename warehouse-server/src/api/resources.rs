//! Warehouse table routes
//!
//! Every entity in the registry gets the same eight routes under
//! `/api/{resource}`:
//!
//! | Path                 | Method | Operation    | Success                      |
//! |----------------------|--------|--------------|------------------------------|
//! | /                    | GET    | list         | 200 `[row]`                  |
//! | /{id}                | GET    | get          | 200 `row`                    |
//! | /                    | POST   | create       | 201 `row`                    |
//! | /{id}                | PUT    | update       | 200 `row`                    |
//! | /{id}                | DELETE | soft delete  | 200 `{message}`              |
//! | /bulk-delete         | POST   | bulk delete  | 200 `{deleted}`              |
//! | /sync                | POST   | full replace | 200 `{synced,total,replaced}`|
//! | /import              | POST   | append       | 200 `{imported}`             |

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::Value;
use shared::client::{
    BulkDeleteRequest, BulkDeleteResponse, ImportRequest, ImportResponse, MessageResponse,
    SyncRequest, SyncResponse,
};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Arrival, Attendance, Damage, Dcc, Employee, Location, ProjectProductivity, QcReturn, Soh,
    Transaction, Unloading, Vas,
};

use super::extract::{Json, Path};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::{SqlEntity, SyncOutcome};

pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(resource_router::<Arrival>())
        .merge(resource_router::<Transaction>())
        .merge(resource_router::<Vas>())
        .merge(resource_router::<Dcc>())
        .merge(resource_router::<Damage>())
        .merge(resource_router::<Soh>())
        .merge(resource_router::<QcReturn>())
        .merge(resource_router::<Location>())
        .merge(resource_router::<Attendance>())
        .merge(resource_router::<Employee>())
        .merge(resource_router::<ProjectProductivity>())
        .merge(resource_router::<Unloading>())
}

/// The eight routes for one entity type
pub fn resource_router<T: SqlEntity>() -> Router<ServerState> {
    let base = format!("/api/{}", T::SCHEMA.resource);

    Router::new()
        .route(&base, get(list::<T>).post(create::<T>))
        .route(&format!("{base}/bulk-delete"), post(bulk_delete::<T>))
        .route(&format!("{base}/sync"), post(sync::<T>))
        .route(&format!("{base}/import"), post(batch_import::<T>))
        .route(
            &format!("{base}/{{id}}"),
            get(get_by_id::<T>).put(update::<T>).delete(remove::<T>),
        )
}

pub(crate) async fn list<T: SqlEntity>(State(state): State<ServerState>) -> AppResult<Json<Vec<T>>> {
    let rows = state.engine::<T>().list().await?;
    Ok(Json(rows))
}

pub(crate) async fn get_by_id<T: SqlEntity>(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<T>> {
    let row = state.engine::<T>().get(id).await?;
    Ok(Json(row))
}

pub(crate) async fn create<T: SqlEntity>(
    State(state): State<ServerState>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<T>)> {
    let row = state.engine::<T>().create(payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub(crate) async fn update<T: SqlEntity>(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> AppResult<Json<T>> {
    let row = state.engine::<T>().update(id, payload).await?;
    Ok(Json(row))
}

async fn remove<T: SqlEntity>(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    state.engine::<T>().delete(id).await?;
    Ok(Json(MessageResponse::new("Deleted")))
}

async fn bulk_delete<T: SqlEntity>(
    State(state): State<ServerState>,
    Json(req): Json<BulkDeleteRequest>,
) -> AppResult<Json<BulkDeleteResponse>> {
    let deleted = state.engine::<T>().bulk_delete(&req.ids).await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

/// Without `confirm: true` nothing changes and the caller gets both counts
async fn sync<T: SqlEntity>(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<SyncRequest>,
) -> AppResult<Json<SyncResponse>> {
    match state.engine::<T>().sync(req, &current.username).await? {
        SyncOutcome::Replaced(summary) => Ok(Json(summary)),
        SyncOutcome::ConfirmationRequired {
            existing_count,
            new_count,
        } => Err(AppError::new(ErrorCode::SyncConfirmationRequired)
            .with_detail("existing_count", existing_count)
            .with_detail("new_count", new_count)),
    }
}

async fn batch_import<T: SqlEntity>(
    State(state): State<ServerState>,
    Json(req): Json<ImportRequest>,
) -> AppResult<Json<ImportResponse>> {
    let imported = state.engine::<T>().batch_import(req.data).await?;
    Ok(Json(ImportResponse { imported }))
}

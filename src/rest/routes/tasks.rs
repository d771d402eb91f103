// rest/routes/tasks.rs — Owner-scoped task routes.
//
// The auth middleware has already resolved the caller; every handler reads
// the owner id from the AuthedUser extension and passes it into the store,
// which scopes each query. Body-supplied `owner`/`id` fields are never
// trusted.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::auth::AuthedUser;
use crate::export;
use crate::import;
use crate::rest::error::ApiError;
use crate::tasks::{TaskDraft, TaskRow};
use crate::AppContext;

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Extension(AuthedUser(owner)): Extension<AuthedUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<TaskRow>), ApiError> {
    let draft = TaskDraft::from_json(&body).map_err(ApiError::Validation)?;
    let task = ctx
        .task_store
        .create(&owner, &draft)
        .await
        .map_err(ApiError::Store)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    Extension(AuthedUser(owner)): Extension<AuthedUser>,
) -> Result<Json<Vec<TaskRow>>, ApiError> {
    let tasks = ctx.task_store.list(&owner).await.map_err(ApiError::Store)?;
    Ok(Json(tasks))
}

/// Full-document replace. A non-owned or nonexistent id is a no-op: the
/// response is 200 with a `null` body, matching the create/update contract
/// existing clients rely on.
pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Extension(AuthedUser(owner)): Extension<AuthedUser>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Option<TaskRow>>, ApiError> {
    let draft = TaskDraft::from_json(&body).map_err(ApiError::Validation)?;
    let task = ctx
        .task_store
        .update(&owner, &id, &draft)
        .await
        .map_err(ApiError::Store)?;
    Ok(Json(task))
}

/// 204 whether or not a matching task existed.
pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Extension(AuthedUser(owner)): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.task_store
        .delete(&owner, &id)
        .await
        .map_err(ApiError::Store)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk CSV upload: one multipart file field, one batch insert. The batch
/// commits or rolls back as a unit.
pub async fn upload_tasks(
    State(ctx): State<Arc<AppContext>>,
    Extension(AuthedUser(owner)): Extension<AuthedUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, &'static str), ApiError> {
    let mut buffer = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("could not read upload: {e}")))?;
            buffer = Some(bytes);
            break;
        }
    }
    let buffer = buffer.ok_or_else(|| ApiError::Validation("missing file field".to_string()))?;

    let drafts = import::parse_csv(&buffer)?;
    let count = ctx
        .task_store
        .insert_batch(&owner, &drafts)
        .await
        .map_err(ApiError::BulkImport)?;
    info!(owner = %owner, count, "bulk import committed");

    Ok((StatusCode::CREATED, "Tasks uploaded"))
}

pub async fn export_tasks(
    State(ctx): State<Arc<AppContext>>,
    Extension(AuthedUser(owner)): Extension<AuthedUser>,
) -> Result<([(header::HeaderName, &'static str); 2], Vec<u8>), ApiError> {
    let tasks = ctx
        .task_store
        .list(&owner)
        .await
        .map_err(ApiError::Export)?;
    let bytes = export::tasks_workbook(&tasks).map_err(|e| ApiError::Export(e.into()))?;
    info!(owner = %owner, rows = tasks.len(), "exported workbook");

    Ok((
        [
            (header::CONTENT_TYPE, export::CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, export::CONTENT_DISPOSITION),
        ],
        bytes,
    ))
}

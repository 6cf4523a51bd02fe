//! Assignment (task) routes.
//!
//! GET    /api/tasks-data        - List tasks, optionally for one term
//! POST   /api/tasks-data        - Create a task
//! PUT    /api/tasks-data        - Replace a task's fields (id in body)
//! DELETE /api/tasks-data        - Delete every task of a term
//! PUT    /api/tasks-data/{id}   - Partial update; blank fields keep stored values
//! DELETE /api/tasks-data/{id}   - Delete one task

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::models::{non_blank, DataResponse, MessageResponse, TaskInput, TaskRecord, TermQuery};
use crate::state::AppState;
use crate::store::{collections, Filter, StoreError};

/// Build the tasks router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/tasks-data",
            get(list_tasks)
                .post(create_task)
                .put(replace_task)
                .delete(delete_term_tasks),
        )
        .route("/api/tasks-data/{id}", put(patch_task).delete(delete_task))
}

fn task_not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound { .. } => ApiError::not_found("Task not found."),
        other => other.into(),
    }
}

async fn list_tasks(
    Extension(state): Extension<AppState>,
    Query(query): Query<TermQuery>,
) -> Result<Json<DataResponse<Vec<TaskRecord>>>, ApiError> {
    let filters: Vec<Filter> = non_blank(&query.term)
        .map(|term| Filter::eq("term", term))
        .into_iter()
        .collect();

    let docs = state.store.list(collections::TASKS, &filters).await?;
    Ok(Json(DataResponse::new(
        docs.iter().map(TaskRecord::from).collect(),
    )))
}

async fn create_task(
    Extension(state): Extension<AppState>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(input) = payload?;
    if non_blank(&input.term).is_none() || non_blank(&input.title).is_none() {
        return Err(ApiError::bad_request("term and title are required"));
    }

    let doc = state
        .store
        .insert(collections::TASKS, input.to_full_fields())
        .await?;
    info!("Task {} created for term {:?}", doc.id, input.term);

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": doc.id }))))
}

async fn replace_task(
    Extension(state): Extension<AppState>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let id = non_blank(&input.id).ok_or_else(|| ApiError::bad_request("id is required"))?;

    state
        .store
        .update(collections::TASKS, id, input.to_full_fields(), None)
        .await
        .map_err(task_not_found)?;
    info!("Task {} replaced", id);

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct DeleteTermInput {
    term: Option<String>,
}

/// Remove every task of a term in one batch.
async fn delete_term_tasks(
    Extension(state): Extension<AppState>,
    payload: Result<Json<DeleteTermInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    let term = non_blank(&input.term)
        .ok_or_else(|| ApiError::bad_request("Term is required for deletion."))?;

    let removed = state
        .store
        .delete_where(collections::TASKS, &[Filter::eq("term", term)])
        .await?;

    let message = if removed == 0 {
        format!("No tasks found for term '{}'. Nothing to delete.", term)
    } else {
        info!("Deleted {} tasks for term {}", removed, term);
        format!("Successfully deleted {} tasks for term '{}'.", removed, term)
    };

    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

async fn patch_task(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;

    state
        .store
        .update(collections::TASKS, &id, input.to_partial_fields(), None)
        .await
        .map_err(task_not_found)?;

    Ok(Json(json!({ "message": "Task updated successfully." })))
}

async fn delete_task(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.store.delete(collections::TASKS, &id).await? {
        return Err(ApiError::not_found("Task not found."));
    }
    info!("Task {} deleted", id);

    Ok(Json(json!({ "message": "Task deleted successfully." })))
}

//! Teacher directory routes.
//!
//! GET    /api/teacher-data        - List teachers
//! POST   /api/teacher-data        - Add a teacher
//! PUT    /api/teacher-data        - Update a teacher (id in body)
//! DELETE /api/teacher-data        - Remove a teacher (id in body)
//! PUT    /api/teacher-data/{id}   - Update a teacher
//! DELETE /api/teacher-data/{id}   - Remove a teacher

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::ApiError;
use crate::models::{non_blank, DataResponse, Teacher, TeacherInput};
use crate::state::AppState;
use crate::store::{collections, StoreError};

/// Build the teachers router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/teacher-data",
            get(list_teachers)
                .post(create_teacher)
                .put(update_teacher_by_body)
                .delete(delete_teacher_by_body),
        )
        .route(
            "/api/teacher-data/{id}",
            put(update_teacher).delete(delete_teacher),
        )
}

fn teacher_fields(email: &str, name: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("email".into(), Value::String(email.to_string()));
    fields.insert("name".into(), Value::String(name.to_string()));
    fields
}

async fn write_teacher(
    state: &AppState,
    id: &str,
    email: &str,
    name: &str,
) -> Result<Teacher, ApiError> {
    let doc = state
        .store
        .update(collections::TEACHERS, id, teacher_fields(email, name), None)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::not_found("Teacher not found."),
            other => other.into(),
        })?;
    info!("Teacher {} updated", id);
    Ok(Teacher::from(&doc))
}

async fn remove_teacher(state: &AppState, id: &str) -> Result<(), ApiError> {
    if !state.store.delete(collections::TEACHERS, id).await? {
        return Err(ApiError::not_found("Teacher not found."));
    }
    info!("Teacher {} deleted", id);
    Ok(())
}

async fn list_teachers(
    Extension(state): Extension<AppState>,
) -> Result<Json<DataResponse<Vec<Teacher>>>, ApiError> {
    let docs = state.store.list(collections::TEACHERS, &[]).await?;
    Ok(Json(DataResponse::new(docs.iter().map(Teacher::from).collect())))
}

async fn create_teacher(
    Extension(state): Extension<AppState>,
    payload: Result<Json<TeacherInput>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Teacher>>), ApiError> {
    let Json(input) = payload?;
    let (Some(email), Some(name)) = (non_blank(&input.email), non_blank(&input.name)) else {
        return Err(ApiError::bad_request("Email and name are required"));
    };

    let doc = state
        .store
        .insert(collections::TEACHERS, teacher_fields(email, name))
        .await?;
    info!("Teacher {} added: {}", doc.id, email);

    Ok((StatusCode::CREATED, Json(DataResponse::new(Teacher::from(&doc)))))
}

async fn update_teacher_by_body(
    Extension(state): Extension<AppState>,
    payload: Result<Json<TeacherInput>, JsonRejection>,
) -> Result<Json<DataResponse<Teacher>>, ApiError> {
    let Json(input) = payload?;
    let (Some(id), Some(email), Some(name)) = (
        non_blank(&input.id),
        non_blank(&input.email),
        non_blank(&input.name),
    ) else {
        return Err(ApiError::bad_request("ID, email, and name are required"));
    };

    let teacher = write_teacher(&state, id, email, name).await?;
    Ok(Json(DataResponse::new(teacher)))
}

async fn delete_teacher_by_body(
    Extension(state): Extension<AppState>,
    payload: Result<Json<TeacherInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let id = non_blank(&input.id).ok_or_else(|| ApiError::bad_request("ID is required"))?;

    remove_teacher(&state, id).await?;
    Ok(Json(json!({ "message": "Teacher deleted successfully." })))
}

async fn update_teacher(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TeacherInput>, JsonRejection>,
) -> Result<Json<DataResponse<Teacher>>, ApiError> {
    let Json(input) = payload?;
    let (Some(email), Some(name)) = (non_blank(&input.email), non_blank(&input.name)) else {
        return Err(ApiError::bad_request("Email and name are required"));
    };

    let teacher = write_teacher(&state, &id, email, name).await?;
    Ok(Json(DataResponse::new(teacher)))
}

async fn delete_teacher(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove_teacher(&state, &id).await?;
    Ok(Json(json!({ "message": "Teacher deleted successfully." })))
}

//! Project routes (`project-approve` collection).
//!
//! GET  /api/project-data       - Project summaries filtered by term/status/email, or one by `projectid`
//! GET  /api/project-data/{id}  - Full project document
//! POST /api/project-data/{id}  - Record the subject teacher's score

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::models::{non_blank, DataResponse, ProjectQuery, ProjectSummary, ScoreInput};
use crate::state::AppState;
use crate::store::{collections, Filter, StoreError};

/// Build the projects router.
pub fn router() -> Router {
    Router::new()
        .route("/api/project-data", get(list_projects))
        .route("/api/project-data/{id}", get(get_project).post(score_project))
}

/// Project summaries for the query; shared with the page views.
pub async fn find_projects(
    state: &AppState,
    query: &ProjectQuery,
) -> Result<Vec<ProjectSummary>, ApiError> {
    if let Some(project_id) = non_blank(&query.projectid) {
        let doc = state.store.get(collections::PROJECTS, project_id).await?;
        return Ok(doc.iter().map(ProjectSummary::from).collect());
    }

    let filters: Vec<Filter> = [
        ("term", &query.term),
        ("status", &query.status),
        ("email", &query.email),
    ]
    .into_iter()
    .filter_map(|(field, value)| non_blank(value).map(|v| Filter::eq(field, v)))
    .collect();

    let docs = state.store.list(collections::PROJECTS, &filters).await?;
    Ok(docs.iter().map(ProjectSummary::from).collect())
}

async fn list_projects(
    Extension(state): Extension<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<DataResponse<Vec<ProjectSummary>>>, ApiError> {
    Ok(Json(DataResponse::new(find_projects(&state, &query).await?)))
}

/// Retrieve the raw project document.
async fn get_project(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doc = state
        .store
        .get(collections::PROJECTS, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(Json(json!({ "data": Value::Object(doc.data), "id": doc.id })))
}

async fn score_project(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ScoreInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let score = match input.score_from_subject_teacher {
        Some(Value::Number(n)) => Value::Number(n),
        _ => {
            return Err(ApiError::bad_request(
                "score_from_subject_teacher is required and must be a number",
            ))
        }
    };

    let mut patch = serde_json::Map::new();
    patch.insert("score_from_subject_teacher".into(), score.clone());
    state
        .store
        .update(collections::PROJECTS, &id, patch, None)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::not_found("Project not found"),
            other => other.into(),
        })?;
    info!("Subject teacher score {} recorded for project {}", score, id);

    Ok(Json(json!({ "id": id, "score_from_subject_teacher": score })))
}

//! Term (form) administration routes.
//!
//! GET  /api/form-data          - List forms, optionally by `isOpen` / `term`
//! GET  /api/form-data/{term}   - Forms of one term
//! POST /api/form-data          - Open a new term
//! PUT  /api/form-data          - Update a term's settings (including open/close)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::models::{non_blank, DataResponse, Form, FormInput};
use crate::state::AppState;
use crate::store::{collections, Filter};
use crate::timestamp;

/// Build the forms router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/form-data",
            get(list_forms).post(create_form).put(update_form),
        )
        .route("/api/form-data/{term}", get(forms_for_term))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuery {
    pub is_open: Option<String>,
    pub term: Option<String>,
}

/// Forms matching the query, latest `updatedAt` first.
pub async fn find_forms(state: &AppState, query: &FormQuery) -> Result<Vec<Form>, ApiError> {
    let mut filters = Vec::new();
    if let Some(raw) = non_blank(&query.is_open) {
        let open = match raw {
            "true" => true,
            "false" => false,
            other => {
                return Err(ApiError::bad_request(format!(
                    "isOpen must be true or false, got {:?}",
                    other
                )))
            }
        };
        filters.push(Filter::eq("isOpen", open));
    }
    if let Some(term) = non_blank(&query.term) {
        filters.push(Filter::eq("term", term));
    }

    let docs = state.store.list(collections::FORMS, &filters).await?;
    let mut dated: Vec<_> = docs
        .iter()
        .map(|doc| {
            let updated = doc
                .field("updatedAt")
                .and_then(timestamp::normalize)
                .or_else(|| doc.field("createdAt").and_then(timestamp::normalize));
            (updated, Form::from(doc))
        })
        .collect();
    // `None` sorts first ascending, so reversing puts undated forms last.
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(dated.into_iter().map(|(_, form)| form).collect())
}

async fn list_forms(
    Extension(state): Extension<AppState>,
    Query(query): Query<FormQuery>,
) -> Result<Json<DataResponse<Vec<Form>>>, ApiError> {
    Ok(Json(DataResponse::new(find_forms(&state, &query).await?)))
}

async fn forms_for_term(
    Extension(state): Extension<AppState>,
    Path(term): Path<String>,
) -> Result<Json<DataResponse<Vec<Form>>>, ApiError> {
    let query = FormQuery {
        is_open: None,
        term: Some(term),
    };
    Ok(Json(DataResponse::new(find_forms(&state, &query).await?)))
}

async fn create_form(
    Extension(state): Extension<AppState>,
    payload: Result<Json<FormInput>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Form>>), ApiError> {
    let Json(input) = payload?;
    let term = non_blank(&input.term)
        .ok_or_else(|| ApiError::bad_request("term is required"))?
        .to_string();
    if input.has_non_numeric_limit() {
        return Err(ApiError::bad_request("Score and project limits must be numbers"));
    }

    let existing = state
        .store
        .list(collections::FORMS, &[Filter::eq("term", term.as_str())])
        .await?;
    if !existing.is_empty() {
        return Err(ApiError::Conflict(format!("Term '{}' already exists", term)));
    }

    let now = Value::String(timestamp::now_iso());
    let mut fields = serde_json::Map::new();
    fields.insert("isOpen".into(), Value::Bool(false));
    for key in [
        "projectLimit",
        "directorScoreLimit",
        "adviserScoreLimit",
        "subjectScoreLimit",
    ] {
        fields.insert(key.into(), Value::from(0));
    }
    fields.extend(input.to_fields());
    fields.insert("createdAt".into(), now.clone());
    fields.insert("updatedAt".into(), now);

    let doc = state.store.insert(collections::FORMS, fields).await?;
    info!("Form {} created for term {}", doc.id, term);

    Ok((StatusCode::CREATED, Json(DataResponse::new(Form::from(&doc)))))
}

async fn update_form(
    Extension(state): Extension<AppState>,
    payload: Result<Json<FormInput>, JsonRejection>,
) -> Result<Json<DataResponse<Form>>, ApiError> {
    let Json(input) = payload?;
    let id = non_blank(&input.id)
        .ok_or_else(|| ApiError::bad_request("id is required"))?
        .to_string();
    if input.has_non_numeric_limit() {
        return Err(ApiError::bad_request("Score and project limits must be numbers"));
    }

    if state.store.get(collections::FORMS, &id).await?.is_none() {
        return Err(ApiError::not_found("Form not found."));
    }

    let mut patch = input.to_fields();
    patch.insert("updatedAt".into(), Value::String(timestamp::now_iso()));
    let doc = state.store.update(collections::FORMS, &id, patch, None).await?;
    info!("Form {} updated (isOpen={:?})", id, input.is_open);

    Ok(Json(DataResponse::new(Form::from(&doc))))
}

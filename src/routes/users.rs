//! User account routes.
//!
//! GET /api/user                  - Filtered, paginated user list
//! GET /api/user/{id}             - Users whose `id` field matches
//! PUT /api/user/{id}             - Change a user's role
//! PUT /api/user/{id}/fcm-token   - Register the device token used for push

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::ApiError;
use crate::models::{non_blank, FcmTokenInput, RoleInput};
use crate::state::AppState;
use crate::store::{collections, Document, Filter, StoreError};

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;

/// Build the users router.
pub fn router() -> Router {
    Router::new()
        .route("/api/user", get(list_users))
        .route("/api/user/{id}", get(get_user).put(update_role))
        .route("/api/user/{id}/fcm-token", put(update_fcm_token))
}

/// Parsed `GET /api/user` query: pagination plus arbitrary field filters.
#[derive(Debug, PartialEq)]
pub struct UserQuery {
    pub page: usize,
    pub limit: usize,
    pub filters: Vec<(String, String)>,
}

impl UserQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut page = DEFAULT_PAGE;
        let mut limit = DEFAULT_LIMIT;
        let mut filters = Vec::new();

        for (key, value) in pairs {
            let value = value.trim().to_string();
            match key.as_str() {
                "page" => page = value.parse().ok().filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
                "limit" => {
                    limit = value.parse().ok().filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT)
                }
                _ if value.is_empty() => {}
                _ => filters.push((key, value)),
            }
        }

        Self {
            page,
            limit,
            filters,
        }
    }

    fn has_email_filter(&self) -> bool {
        self.filters.iter().any(|(k, _)| k == "email")
    }

    /// Email matches case-insensitively by prefix; other fields by equality.
    fn store_filters(&self) -> Vec<Filter> {
        self.filters
            .iter()
            .map(|(key, value)| {
                if key == "email" {
                    Filter::prefix("email", value.to_lowercase())
                } else {
                    Filter::eq(key.as_str(), value.as_str())
                }
            })
            .collect()
    }
}

fn paginate(mut docs: Vec<Document>, query: &UserQuery) -> Vec<Value> {
    if query.has_email_filter() {
        docs.sort_by(|a, b| {
            a.str_field("email")
                .unwrap_or_default()
                .cmp(b.str_field("email").unwrap_or_default())
        });
    }
    let start = (query.page - 1).saturating_mul(query.limit);
    docs.into_iter()
        .skip(start)
        .take(query.limit)
        .map(Document::into_json_with_id)
        .collect()
}

async fn list_users(
    Extension(state): Extension<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let query = UserQuery::from_pairs(pairs);
    let docs = state
        .store
        .list(collections::USERS, &query.store_filters())
        .await?;
    Ok(Json(paginate(docs, &query)))
}

async fn get_user(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let docs = state
        .store
        .list(collections::USERS, &[Filter::eq("id", id.as_str())])
        .await?;
    let users: Vec<Value> = docs.into_iter().map(Document::into_json_with_id).collect();
    Ok(Json(json!({ "users": users })))
}

async fn set_user_field(
    state: &AppState,
    id: &str,
    field: &str,
    value: &str,
) -> Result<(), ApiError> {
    let mut patch = Map::new();
    patch.insert(field.to_string(), Value::String(value.to_string()));
    state
        .store
        .update(collections::USERS, id, patch, None)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => ApiError::not_found("User not found"),
            other => other.into(),
        })?;
    Ok(())
}

async fn update_role(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RoleInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let role = non_blank(&input.role).ok_or_else(|| ApiError::bad_request("role is required"))?;

    set_user_field(&state, &id, "role", role).await?;
    info!("User {} role set to {}", id, role);

    Ok(Json(json!({ "message": "User updated successfully" })))
}

async fn update_fcm_token(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FcmTokenInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let token =
        non_blank(&input.fcm_token).ok_or_else(|| ApiError::bad_request("fcmToken is required"))?;

    set_user_field(&state, &id, "fcmToken", token).await?;
    info!("Push token registered for user {}", id);

    Ok(Json(json!({ "message": "Push token registered" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn query_defaults_and_ignores_blank_filters() {
        let query = UserQuery::from_pairs(pairs(&[("role", "  "), ("page", "0"), ("limit", "x")]));
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert!(query.filters.is_empty());
    }

    #[test]
    fn email_filter_becomes_lowercase_prefix() {
        let query = UserQuery::from_pairs(pairs(&[("email", "Som"), ("role", "teacher")]));
        assert_eq!(
            query.store_filters(),
            vec![Filter::prefix("email", "som"), Filter::eq("role", "teacher")]
        );
    }
}

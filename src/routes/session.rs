//! Session cookie routes.
//!
//! POST /api/session/login  - Set the email/role/name cookies
//! POST /api/session/logout - Expire them
//! GET  /api/session        - Report the current cookie session

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::models::{non_blank, LoginInput};
use crate::session::Session;
use crate::state::AppState;

/// Build the session router.
pub fn router() -> Router {
    Router::new()
        .route("/api/session", get(current_session))
        .route("/api/session/login", post(login))
        .route("/api/session/logout", post(logout))
}

async fn login(
    Extension(state): Extension<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(HeaderMap, Json<Value>), ApiError> {
    let Json(input) = payload?;
    let (Some(email), Some(role), Some(name)) = (
        non_blank(&input.email),
        non_blank(&input.role),
        non_blank(&input.name),
    ) else {
        return Err(ApiError::bad_request("email, role and name are required"));
    };

    let headers = state.cookie_policy().login_headers(email, role, name);
    info!("Session started for {} as {}", email, role);

    Ok((headers, Json(json!({ "email": email, "role": role, "name": name }))))
}

async fn logout(Extension(state): Extension<AppState>) -> (HeaderMap, Json<Value>) {
    (
        state.cookie_policy().logout_headers(),
        Json(json!({ "success": true })),
    )
}

async fn current_session(headers: HeaderMap) -> Json<Value> {
    let session = Session::from_headers(&headers);
    let mut body = serde_json::to_value(&session).unwrap_or_else(|_| json!({}));
    body["authenticated"] = Value::Bool(session.is_authenticated());
    Json(body)
}

//! Push notification routes.
//!
//! POST /api/notify           - Send a notification to one user (by email) or everyone
//! POST /api/notify/preview   - Show how a client renders a background push payload

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::models::{non_blank, NotifyInput};
use crate::push::{render_background, DisplayNotification, Notification};
use crate::state::AppState;
use crate::store::{collections, Document, Filter};

/// Build the notification router.
pub fn router() -> Router {
    Router::new()
        .route("/api/notify", post(send_notification))
        .route("/api/notify/preview", post(preview_notification))
}

fn token_of(doc: &Document) -> Option<String> {
    doc.str_field("fcmToken")
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Device tokens to target: the first user with `email`, or every user.
async fn collect_tokens(state: &AppState, email: Option<&str>) -> Result<Vec<String>, ApiError> {
    let tokens = match email {
        Some(email) => state
            .store
            .list(collections::USERS, &[Filter::eq("email", email)])
            .await?
            .first()
            .and_then(token_of)
            .into_iter()
            .collect(),
        None => state
            .store
            .list(collections::USERS, &[])
            .await?
            .iter()
            .filter_map(token_of)
            .collect(),
    };
    Ok(tokens)
}

async fn send_notification(
    Extension(state): Extension<AppState>,
    payload: Result<Json<NotifyInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let (Some(title), Some(body)) = (non_blank(&input.title), non_blank(&input.message_body))
    else {
        return Err(ApiError::bad_request("Title and body are required"));
    };
    let email = non_blank(&input.email);

    let tokens = collect_tokens(&state, email).await?;
    if tokens.is_empty() {
        let message = match email {
            Some(email) => format!("No FCM token found for email: {}", email),
            None => "No FCM tokens found for any users".to_string(),
        };
        return Ok(Json(json!({ "success": false, "message": message })));
    }

    let notification = Notification {
        title: title.to_string(),
        body: body.to_string(),
    };
    let summary = state.push.send(&tokens, &notification).await?;
    info!("{} messages were sent successfully", summary.success_count);

    Ok(Json(json!({ "success": true, "response": summary })))
}

async fn preview_notification(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DisplayNotification>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(render_background(&payload)))
}

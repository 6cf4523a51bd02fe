//! Exam appointment routes (`project-availability` collection).
//!
//! GET  /api/project-availability/{projectId} - The project's availability document
//! POST /api/project-availability/{projectId} - Student books (or rebooks) a slot with a teacher
//! PUT  /api/project-availability/{projectId} - Reschedule an appointment and edit remarks
//!
//! Both writes re-read the document, merge into `studentSelections` and write
//! back only if the document version is unchanged, retrying on conflict.

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::availability::{self, RescheduleError, StudentSelections, SELECTIONS_FIELD};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{collections, StoreError};

/// Build the availability router.
pub fn router() -> Router {
    Router::new().route(
        "/api/project-availability/{projectId}",
        get(get_availability).post(book_slot).put(reschedule_slot),
    )
}

// ============================================================================
// Request bodies
// ============================================================================

// Fields stay untyped so each can be validated with its own message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookInput {
    student_email: Option<Value>,
    student_name: Option<Value>,
    teacher_email: Option<Value>,
    slot: Option<Value>,
    remarks: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RescheduleInput {
    student_email: Option<Value>,
    teacher_email: Option<Value>,
    new_slot: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    new_student_remarks: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    new_teacher_remarks: Option<Value>,
}

/// `Some` for any value the client sent, `null` included; absent keys stay
/// `None` through `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn required_string(value: &Option<Value>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(ApiError::bad_request(message)),
    }
}

fn optional_string(value: Option<Value>, message: &str) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ApiError::bad_request(message)),
    }
}

fn project_not_found() -> ApiError {
    ApiError::not_found("Project not found")
}

// ============================================================================
// Optimistic read-modify-write
// ============================================================================

/// Apply `change` to the project's selections and persist them, retrying
/// from a fresh read whenever another writer got there first.
async fn modify_selections<T, F>(
    state: &AppState,
    project_id: &str,
    mut change: F,
) -> Result<T, ApiError>
where
    F: FnMut(&mut StudentSelections) -> Result<T, ApiError>,
{
    let attempts = state.config.appointment_max_attempts;
    for attempt in 1..=attempts {
        let doc = state
            .store
            .get(collections::AVAILABILITY, project_id)
            .await?
            .ok_or_else(project_not_found)?;

        let mut selections = StudentSelections::from_field(doc.field(SELECTIONS_FIELD));
        let outcome = change(&mut selections)?;

        let mut patch = Map::new();
        patch.insert(SELECTIONS_FIELD.to_string(), selections.to_value());

        match state
            .store
            .update(collections::AVAILABILITY, project_id, patch, Some(doc.version))
            .await
        {
            Ok(_) => return Ok(outcome),
            Err(StoreError::VersionConflict { expected, actual }) => {
                warn!(
                    "Availability {} changed during write (v{} -> v{}), attempt {}/{}",
                    project_id, expected, actual, attempt, attempts
                );
            }
            Err(StoreError::NotFound { .. }) => return Err(project_not_found()),
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Conflict(
        "Appointments for this project are being changed by someone else, please retry".to_string(),
    ))
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_availability(
    Extension(state): Extension<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doc = state
        .store
        .get(collections::AVAILABILITY, &project_id)
        .await?
        .ok_or_else(project_not_found)?;

    Ok(Json(json!({ "projectData": Value::Object(doc.data) })))
}

async fn book_slot(
    Extension(state): Extension<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let student_email = required_string(
        &input.student_email,
        "studentEmail is required and must be a non-empty string.",
    )?;
    let student_name = required_string(
        &input.student_name,
        "studentName is required and must be a non-empty string.",
    )?;
    let teacher_email = required_string(
        &input.teacher_email,
        "teacherEmail is required and must be a non-empty string.",
    )?;
    let slot = input
        .slot
        .ok_or_else(|| ApiError::bad_request("slot is required."))?;

    let (outcome, appointment) = modify_selections(&state, &project_id, |selections| {
        Ok(availability::book(
            selections,
            &student_email,
            &student_name,
            &teacher_email,
            slot.clone(),
            input.remarks.clone(),
        ))
    })
    .await?;

    info!(
        "Appointment {:?} for {} with {} on project {}",
        outcome, student_email, teacher_email, project_id
    );

    Ok(Json(json!({
        "message": outcome.message(),
        "studentEmail": student_email,
        "appointmentDetail": appointment,
    })))
}

async fn reschedule_slot(
    Extension(state): Extension<AppState>,
    Path(project_id): Path<String>,
    payload: Result<Json<RescheduleInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    let student_email = required_string(
        &input.student_email,
        "studentEmail is required to identify the appointment.",
    )?;
    let teacher_email = required_string(
        &input.teacher_email,
        "teacherEmail is required to identify the specific appointment within the student's record.",
    )?;
    let new_slot = input
        .new_slot
        .ok_or_else(|| ApiError::bad_request("newSlot data is required for the update."))?;
    let student_remarks = optional_string(
        input.new_student_remarks,
        "newStudentRemarks must be a string if provided.",
    )?;
    let teacher_remarks = optional_string(
        input.new_teacher_remarks,
        "newTeacherRemarks must be a string if provided.",
    )?;

    let updated = modify_selections(&state, &project_id, |selections| {
        availability::reschedule(
            selections,
            &student_email,
            &teacher_email,
            new_slot.clone(),
            student_remarks.clone(),
            teacher_remarks.clone(),
        )
        .map_err(|e: RescheduleError| ApiError::not_found(e.to_string()))
    })
    .await?;

    info!(
        "Appointment of {} with {} rescheduled on project {}",
        student_email, teacher_email, project_id
    );

    Ok(Json(json!({
        "message": "Appointment updated successfully.",
        "updatedAppointment": updated,
    })))
}

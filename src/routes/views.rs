//! Page-load views.
//!
//! Aggregations the dashboard pages need before rendering. Listing views
//! degrade to an empty result with an `error` message instead of failing
//! the page; the project detail view reports 404/500.
//!
//! GET /views/form                    - The latest open term
//! GET /views/term/{term}/projects    - Projects of a term
//! GET /views/projects/{projectId}    - One project with ISO timestamps
//! GET /views/teacher-availability    - Director sign-up overview for the open term
//! GET /views/dashboard               - Sidebar menu for the session role

use axum::extract::Path;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tracing::error;

use crate::error::ApiError;
use crate::menu::{menu_for, Role};
use crate::models::{Form, ProjectQuery, ProjectSummary};
use crate::routes::forms::{find_forms, FormQuery};
use crate::routes::projects::find_projects;
use crate::session::Session;
use crate::state::AppState;
use crate::store::collections;
use crate::timestamp;

const PROJECT_NOT_FOUND: &str = "ไม่พบข้อมูลโครงงานที่ระบุ";
const FETCH_FAILED: &str = "เกิดข้อผิดพลาดในการดึงข้อมูล";
const NO_OPEN_TERM: &str = "ไม่พบภาคการศึกษาที่เปิดให้แสดงข้อมูลโครงงาน";
const PROJECTS_FAILED: &str = "เกิดข้อผิดพลาดในการโหลดข้อมูลโครงงาน กรุณาลองใหม่อีกครั้ง";
const UNNAMED_DIRECTOR: &str = "ไม่ระบุ";

const DETAIL_TIMESTAMPS: [&str; 3] = ["lastModified", "createdAt", "lastUpdated"];

/// Build the views router.
pub fn router() -> Router {
    Router::new()
        .route("/views/form", get(open_form))
        .route("/views/term/{term}/projects", get(term_projects))
        .route("/views/projects/{projectId}", get(project_detail))
        .route("/views/teacher-availability", get(teacher_availability))
        .route("/views/dashboard", get(dashboard))
}

async fn latest_open_form(state: &AppState) -> Result<Option<Form>, ApiError> {
    let query = FormQuery {
        is_open: Some("true".to_string()),
        term: None,
    };
    Ok(find_forms(state, &query).await?.into_iter().next())
}

async fn open_form(Extension(state): Extension<AppState>) -> Json<Value> {
    match latest_open_form(&state).await {
        Ok(form) => Json(json!({ "term": form })),
        Err(e) => {
            error!("Error loading form data: {}", e);
            Json(json!({ "term": null, "error": format!("Error loading form data: {}", e) }))
        }
    }
}

async fn projects_of_term(state: &AppState, term: &str) -> Result<Vec<ProjectSummary>, ApiError> {
    let query = ProjectQuery {
        term: Some(term.to_string()),
        ..Default::default()
    };
    find_projects(state, &query).await
}

async fn term_projects(
    Extension(state): Extension<AppState>,
    Path(term): Path<String>,
) -> Json<Value> {
    match projects_of_term(&state, &term).await {
        Ok(projects) => Json(json!({ "terms": projects })),
        Err(e) => {
            error!("Error loading projects for term {}: {}", term, e);
            Json(json!({ "terms": [], "error": format!("Error loading terms: {}", e) }))
        }
    }
}

async fn project_detail(
    Extension(state): Extension<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doc = state
        .store
        .get(collections::PROJECTS, &project_id)
        .await
        .map_err(|e| {
            error!("Error fetching project {}: {}", project_id, e);
            ApiError::internal(FETCH_FAILED)
        })?
        .ok_or_else(|| ApiError::not_found(PROJECT_NOT_FOUND))?;

    let mut project = doc.data;
    timestamp::isoify_fields(&mut project, &DETAIL_TIMESTAMPS);

    Ok(Json(json!({
        "project": project,
        "projectId": project_id,
        "isNotFound": false,
    })))
}

/// Display name for one entry of a project's `directors` list.
fn director_name(director: &Value) -> String {
    ["name", "email"]
        .iter()
        .find_map(|key| {
            director
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(UNNAMED_DIRECTOR)
        .to_string()
}

/// Projects of `term` annotated with their directors, plus the largest
/// director count among them.
pub fn annotate_directors(projects: Vec<ProjectSummary>, term: &str) -> (Vec<Value>, usize) {
    let mut max_directors = 0;
    let annotated = projects
        .into_iter()
        .filter(|p| p.term == term)
        .map(|project| {
            let names: Vec<String> = project
                .directors
                .as_array()
                .map(|ds| ds.iter().map(director_name).collect())
                .unwrap_or_default();
            max_directors = max_directors.max(names.len());

            let mut value = serde_json::to_value(&project).unwrap_or_else(|_| json!({}));
            value["directorCount"] = json!(names.len());
            value["directorNames"] = json!(names);
            value
        })
        .collect();
    (annotated, max_directors)
}

async fn teacher_availability(Extension(state): Extension<AppState>) -> Json<Value> {
    let term = match latest_open_form(&state).await {
        Ok(Some(form)) if !form.term.is_empty() => form.term,
        Ok(_) => {
            return Json(json!({
                "projects": [],
                "fixedTerm": null,
                "maxDirectors": 0,
                "error": NO_OPEN_TERM,
            }))
        }
        Err(e) => {
            error!("Error fetching open term: {}", e);
            return Json(json!({
                "projects": [],
                "fixedTerm": null,
                "maxDirectors": 0,
                "error": PROJECTS_FAILED,
            }));
        }
    };

    match projects_of_term(&state, &term).await {
        Ok(projects) => {
            let (projects, max_directors) = annotate_directors(projects, &term);
            Json(json!({
                "projects": projects,
                "fixedTerm": term,
                "maxDirectors": max_directors,
                "error": null,
            }))
        }
        Err(e) => {
            error!("Error fetching projects: {}", e);
            Json(json!({
                "projects": [],
                "fixedTerm": term,
                "maxDirectors": 0,
                "error": PROJECTS_FAILED,
            }))
        }
    }
}

async fn dashboard(headers: HeaderMap) -> Json<Value> {
    let session = Session::from_headers(&headers);
    let role = Role::parse(session.role.as_deref().unwrap_or_default());
    Json(json!({ "menuItems": menu_for(&role) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Document;

    fn project(term: &str, directors: Value) -> ProjectSummary {
        let doc = Document {
            id: format!("p-{}", term),
            data: json!({ "term": term, "directors": directors })
                .as_object()
                .cloned()
                .unwrap(),
            version: 1,
        };
        ProjectSummary::from(&doc)
    }

    #[test]
    fn director_names_fall_back_to_email_then_placeholder() {
        let (projects, max) = annotate_directors(
            vec![project(
                "1/2568",
                json!([{ "name": "Dr. A" }, { "email": "b@x.th" }, null, {}]),
            )],
            "1/2568",
        );
        assert_eq!(max, 4);
        assert_eq!(
            projects[0]["directorNames"],
            json!(["Dr. A", "b@x.th", UNNAMED_DIRECTOR, UNNAMED_DIRECTOR])
        );
        assert_eq!(projects[0]["directorCount"], 4);
    }

    #[test]
    fn other_terms_are_dropped_and_missing_directors_count_zero() {
        let (projects, max) = annotate_directors(
            vec![project("1/2568", Value::Null), project("2/2567", json!([{ "name": "X" }]))],
            "1/2568",
        );
        assert_eq!(projects.len(), 1);
        assert_eq!(max, 0);
        assert_eq!(projects[0]["directorNames"], json!([]));
    }
}

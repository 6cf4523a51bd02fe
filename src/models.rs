//! API shapes for the portal's collections.
//!
//! Stored documents are schemaless, so every output model is built from a
//! [`Document`] with explicit defaults for missing or mistyped fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Document;
use crate::timestamp;

// ============================================================================
// Field helpers
// ============================================================================

fn string_or_empty(doc: &Document, key: &str) -> String {
    doc.str_field(key).unwrap_or_default().to_string()
}

fn array_or_empty(doc: &Document, key: &str) -> Vec<Value> {
    doc.field(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// A stored number, or 0 when missing, zero or not numeric.
fn number_or_zero(doc: &Document, key: &str) -> Value {
    match doc.field(key) {
        Some(Value::Number(n)) => Value::Number(n.clone()),
        _ => Value::from(0),
    }
}

/// Stored value unless it is missing, null, false, 0 or "".
fn truthy_or(doc: &Document, key: &str, default: Value) -> Value {
    match doc.field(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => default,
        Some(Value::String(s)) if s.is_empty() => default,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => default,
        Some(v) => v.clone(),
    }
}

/// Whether a request value counts as provided: non-empty strings, any other
/// non-null JSON.
pub fn is_present(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Response wrappers
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Forms (terms)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: String,
    pub is_open: bool,
    pub term: String,
    pub created_at: Value,
    pub updated_at: Value,
    pub project_limit: Value,
    pub director_score_limit: Value,
    pub adviser_score_limit: Value,
    pub subject_score_limit: Value,
}

impl From<&Document> for Form {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            is_open: doc.field("isOpen").and_then(Value::as_bool).unwrap_or(false),
            term: string_or_empty(doc, "term"),
            created_at: timestamp::iso_or_null(doc.field("createdAt")),
            updated_at: timestamp::iso_or_null(doc.field("updatedAt")),
            project_limit: number_or_zero(doc, "projectLimit"),
            director_score_limit: number_or_zero(doc, "directorScoreLimit"),
            adviser_score_limit: number_or_zero(doc, "adviserScoreLimit"),
            subject_score_limit: number_or_zero(doc, "subjectScoreLimit"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    pub id: Option<String>,
    pub term: Option<String>,
    pub is_open: Option<bool>,
    pub project_limit: Option<Value>,
    pub director_score_limit: Option<Value>,
    pub adviser_score_limit: Option<Value>,
    pub subject_score_limit: Option<Value>,
}

impl FormInput {
    /// Fields this input sets, by stored name. `id` is never stored.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(term) = non_blank(&self.term) {
            fields.insert("term".into(), Value::String(term.to_string()));
        }
        if let Some(open) = self.is_open {
            fields.insert("isOpen".into(), Value::Bool(open));
        }
        for (key, value) in [
            ("projectLimit", &self.project_limit),
            ("directorScoreLimit", &self.director_score_limit),
            ("adviserScoreLimit", &self.adviser_score_limit),
            ("subjectScoreLimit", &self.subject_score_limit),
        ] {
            if let Some(v) = value.as_ref().filter(|v| v.is_number()) {
                fields.insert(key.into(), v.clone());
            }
        }
        fields
    }

    /// True when a limit was sent but is not a number.
    pub fn has_non_numeric_limit(&self) -> bool {
        [
            &self.project_limit,
            &self.director_score_limit,
            &self.adviser_score_limit,
            &self.subject_score_limit,
        ]
        .into_iter()
        .any(|v| matches!(v, Some(v) if !v.is_number() && !v.is_null()))
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub project_name_th: String,
    pub project_name_en: String,
    pub status: String,
    pub members: Vec<Value>,
    #[serde(rename = "Tasks")]
    pub tasks: Value,
    pub term: String,
    pub adviser: Vec<Value>,
    pub directors: Value,
    pub email: String,
    pub score_from_subject_teacher: Value,
}

impl From<&Document> for ProjectSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            project_name_th: string_or_empty(doc, "project_name_th"),
            project_name_en: string_or_empty(doc, "project_name_en"),
            status: string_or_empty(doc, "status"),
            members: array_or_empty(doc, "members"),
            tasks: truthy_or(doc, "Tasks", Value::Object(Map::new())),
            term: string_or_empty(doc, "term"),
            adviser: array_or_empty(doc, "adviser"),
            directors: truthy_or(doc, "directors", Value::Array(Vec::new())),
            email: string_or_empty(doc, "email"),
            score_from_subject_teacher: truthy_or(doc, "score_from_subject_teacher", Value::from(0)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub term: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
    pub projectid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreInput {
    pub score_from_subject_teacher: Option<Value>,
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub term: String,
    pub title: String,
    pub index: Value,
    pub due_date: Value,
    pub description: String,
}

impl From<&Document> for TaskRecord {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            term: string_or_empty(doc, "term"),
            title: string_or_empty(doc, "title"),
            index: truthy_or(doc, "index", Value::String(String::new())),
            due_date: truthy_or(doc, "dueDate", Value::String(String::new())),
            description: string_or_empty(doc, "description"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub id: Option<String>,
    pub term: Option<String>,
    pub title: Option<String>,
    pub index: Option<Value>,
    pub due_date: Option<Value>,
    pub description: Option<String>,
}

impl TaskInput {
    /// Every task field, with absent values stored as null.
    pub fn to_full_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("term".into(), opt_string(&self.term));
        fields.insert("title".into(), opt_string(&self.title));
        fields.insert("index".into(), self.index.clone().unwrap_or(Value::Null));
        fields.insert("dueDate".into(), self.due_date.clone().unwrap_or(Value::Null));
        fields.insert("description".into(), opt_string(&self.description));
        fields
    }

    /// Only the fields that were provided and non-empty.
    pub fn to_partial_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(term) = non_blank(&self.term) {
            fields.insert("term".into(), Value::String(term.to_string()));
        }
        if let Some(title) = non_blank(&self.title) {
            fields.insert("title".into(), Value::String(title.to_string()));
        }
        if is_present(&self.index) {
            fields.insert("index".into(), self.index.clone().unwrap_or(Value::Null));
        }
        if is_present(&self.due_date) {
            fields.insert("dueDate".into(), self.due_date.clone().unwrap_or(Value::Null));
        }
        if let Some(description) = non_blank(&self.description) {
            fields.insert("description".into(), Value::String(description.to_string()));
        }
        fields
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[derive(Debug, Default, Deserialize)]
pub struct TermQuery {
    pub term: Option<String>,
}

// ============================================================================
// Teachers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Teacher {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<&Document> for Teacher {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            email: string_or_empty(doc, "email"),
            name: string_or_empty(doc, "name"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TeacherInput {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RoleInput {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FcmTokenInput {
    pub fcm_token: Option<String>,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyInput {
    pub title: Option<String>,
    pub message_body: Option<String>,
    pub email: Option<String>,
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
}

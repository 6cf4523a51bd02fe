//! Student appointment bookkeeping for a project.
//!
//! A `project-availability` document holds `studentSelections`: a map from
//! student email to the student's display name and one appointment per
//! teacher. The functions here only mutate that map; persisting it (with a
//! version check) is the route's job.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

pub const SELECTIONS_FIELD: &str = "studentSelections";

const NAME: &str = "name";
const APPOINTMENTS: &str = "appointments";
const TEACHER_EMAIL: &str = "teacherEmail";
const TEACHER_REMARKS: &str = "teacherRemarks";

/// An appointment as written by a booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub teacher_email: String,
    pub slot: Value,
    /// Written by the student.
    pub remarks: Value,
    pub teacher_remarks: Value,
}

/// The stored selections map, kept as raw JSON.
///
/// Entries are only rewritten when they are the one being booked or
/// rescheduled; every other student's data goes back to the store exactly
/// as it was read, whatever its shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudentSelections(pub Map<String, Value>);

impl StudentSelections {
    pub fn from_field(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(entries)) => Self(entries.clone()),
            Some(other) => {
                warn!("Ignoring non-object {}: {}", SELECTIONS_FIELD, other);
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn name(&self, student_email: &str) -> Option<&str> {
        self.0.get(student_email)?.get(NAME)?.as_str()
    }

    /// Stored appointments of a student; empty when missing or malformed.
    pub fn appointments(&self, student_email: &str) -> &[Value] {
        self.0
            .get(student_email)
            .and_then(|entry| entry.get(APPOINTMENTS))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn teacher_of(appointment: &Value) -> Option<&str> {
    appointment.get(TEACHER_EMAIL).and_then(Value::as_str)
}

/// JSON truthiness: everything except null, false, 0 and "".
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_or_empty(value: Option<Value>) -> Value {
    value
        .filter(truthy)
        .unwrap_or_else(|| Value::String(String::new()))
}

// ============================================================================
// Booking
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOutcome {
    Created,
    Updated,
}

impl BookOutcome {
    pub fn message(self) -> &'static str {
        match self {
            BookOutcome::Created => "เพิ่มการนัดหมายใหม่เรียบร้อยแล้ว",
            BookOutcome::Updated => "การนัดหมายกับอาจารย์ท่านนี้ได้รับการอัปเดตแล้ว",
        }
    }
}

/// Student-side booking of a slot with one teacher.
///
/// Rebooking the same teacher replaces slot and student remarks but keeps
/// whatever the teacher already wrote. Any truthy `remarks` value is stored
/// as given.
pub fn book(
    selections: &mut StudentSelections,
    student_email: &str,
    student_name: &str,
    teacher_email: &str,
    slot: Value,
    remarks: Option<Value>,
) -> (BookOutcome, Appointment) {
    let mut entry = match selections.0.remove(student_email) {
        Some(Value::Object(entry)) => entry,
        Some(other) => {
            warn!("Replacing malformed selection entry for {}: {}", student_email, other);
            Map::new()
        }
        None => Map::new(),
    };
    let mut appointments = match entry.remove(APPOINTMENTS) {
        Some(Value::Array(list)) => list,
        Some(other) => {
            warn!("Replacing malformed appointments for {}: {}", student_email, other);
            Vec::new()
        }
        None => Vec::new(),
    };

    let existing = appointments
        .iter()
        .position(|a| teacher_of(a) == Some(teacher_email));
    let teacher_remarks = existing
        .and_then(|i| appointments[i].get(TEACHER_REMARKS).cloned());

    let appointment = Appointment {
        teacher_email: teacher_email.to_string(),
        slot,
        remarks: truthy_or_empty(remarks),
        teacher_remarks: truthy_or_empty(teacher_remarks),
    };
    let stored = serde_json::to_value(&appointment).unwrap_or(Value::Null);

    let outcome = match existing {
        Some(i) => {
            appointments[i] = stored;
            BookOutcome::Updated
        }
        None => {
            appointments.push(stored);
            BookOutcome::Created
        }
    };

    entry.insert(NAME.to_string(), Value::String(student_name.to_string()));
    entry.insert(APPOINTMENTS.to_string(), Value::Array(appointments));
    selections
        .0
        .insert(student_email.to_string(), Value::Object(entry));

    (outcome, appointment)
}

// ============================================================================
// Rescheduling
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RescheduleError {
    #[error("No appointments found for this student.")]
    NoAppointments,

    #[error("Appointment with the specified teacher not found for this student.")]
    TeacherNotFound,
}

/// Move an existing appointment to `new_slot` and return it as stored.
///
/// Remarks are only replaced when a new value is given. Fields of the
/// appointment this call does not set are left alone.
pub fn reschedule(
    selections: &mut StudentSelections,
    student_email: &str,
    teacher_email: &str,
    new_slot: Value,
    new_student_remarks: Option<String>,
    new_teacher_remarks: Option<String>,
) -> Result<Value, RescheduleError> {
    let appointments = selections
        .0
        .get_mut(student_email)
        .and_then(|entry| entry.get_mut(APPOINTMENTS))
        .and_then(Value::as_array_mut)
        .ok_or(RescheduleError::NoAppointments)?;

    let appointment = appointments
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|a| a.get(TEACHER_EMAIL).and_then(Value::as_str) == Some(teacher_email))
        .ok_or(RescheduleError::TeacherNotFound)?;

    appointment.insert("slot".to_string(), new_slot);
    if let Some(remarks) = new_student_remarks {
        appointment.insert("remarks".to_string(), Value::String(remarks));
    }
    if let Some(remarks) = new_teacher_remarks {
        appointment.insert(TEACHER_REMARKS.to_string(), Value::String(remarks));
    }
    Ok(Value::Object(appointment.clone()))
}

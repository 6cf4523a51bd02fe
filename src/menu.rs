//! Dashboard navigation per role.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    SubjectTeacher,
    Teacher,
    Student,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "admin" => Role::Admin,
            "subject_teacher" => Role::SubjectTeacher,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            other => Role::Other(other.to_string()),
        }
    }
}

/// One sidebar entry. Separators carry only an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

impl MenuItem {
    const fn link(id: &'static str, label: &'static str, icon: &'static str) -> Self {
        Self {
            id,
            label: Some(label),
            icon: Some(icon),
        }
    }

    const fn separator(id: &'static str) -> Self {
        Self {
            id,
            label: None,
            icon: None,
        }
    }

    pub fn is_separator(&self) -> bool {
        self.label.is_none()
    }
}

const HOME: MenuItem = MenuItem::link("/TS_Dashboard/", "หน้าแรก", "home");
const OPEN_FORM: MenuItem = MenuItem::link("/TS_Dashboard/OpenForm", "เปิด/ปิด ฟอร์ม", "forms");
const ADD_TASK: MenuItem = MenuItem::link("/TS_Dashboard/Addtask", "มอบหมายงาน", "plus");
const ALL_SCORES: MenuItem =
    MenuItem::link("/TS_Dashboard/Score_all_project", "คะแนนโครงงานทั้งหมด", "number-10");
const DIRECTOR_TABLE: MenuItem =
    MenuItem::link("/TS_Dashboard/Table_director", "ข้อมูลการลงชื่อกรรมการ", "table");
const SELECT_PROJECT: MenuItem =
    MenuItem::link("/TS_Dashboard/SelectProject", "ลงชื่อเป็นกรรมการ", "select");
const APPOINTMENT: MenuItem =
    MenuItem::link("/TS_Dashboard/Appointment", "นัดหมายการสอบ", "clock");
const RATE: MenuItem = MenuItem::link("/TS_Dashboard/Rate", "ให้คะแนน", "star");

pub fn menu_for(role: &Role) -> Vec<MenuItem> {
    match role {
        Role::Admin | Role::SubjectTeacher => vec![
            MenuItem::separator("sprade_subject_teacher"),
            HOME,
            OPEN_FORM,
            ADD_TASK,
            ALL_SCORES,
            MenuItem::separator("sprade_teacher"),
            DIRECTOR_TABLE,
            SELECT_PROJECT,
            APPOINTMENT,
            RATE,
        ],
        Role::Teacher => vec![HOME, DIRECTOR_TABLE, SELECT_PROJECT, APPOINTMENT, RATE],
        Role::Student | Role::Other(_) => Vec::new(),
    }
}

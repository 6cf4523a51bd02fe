//! HTTP route modules for the project portal.
//!
//! Each module owns the routes for one collection or concern:
//! - `forms`: term settings (`forms`)
//! - `projects`: project summaries and subject-teacher scores (`project-approve`)
//! - `tasks`: assignments per term (`Task`)
//! - `teachers`: teacher directory (`teacher`)
//! - `users`: accounts, roles and push tokens (`users`)
//! - `notify`: push notifications
//! - `availability`: exam appointments (`project-availability`)
//! - `session`: cookie session
//! - `views`: page-load aggregations for the dashboard

pub mod availability;
pub mod forms;
pub mod notify;
pub mod projects;
pub mod session;
pub mod tasks;
pub mod teachers;
pub mod users;
pub mod views;

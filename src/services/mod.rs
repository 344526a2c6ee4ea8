pub mod access;
pub mod auth_service;
pub mod email_service;
pub mod note_service;
pub mod profile_service;
pub mod project_service;
pub mod task_service;
pub mod team_service;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

use crate::models::{Note, Project, StatusChange, Task, Token, User};
use crate::utils::AppResult;

/// Persistence operations used by the services.
///
/// Multi-document writes are exposed as single-document primitives
/// (`$push`/`$pull`/`$addToSet` style) so services can order them and
/// undo the first step when the second one fails.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round-trip used by the health check.
    async fn ping(&self) -> AppResult<()>;

    // ==================== USERS ====================
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_user(&self, id: &ObjectId) -> AppResult<Option<User>>;
    async fn find_users(&self, ids: &[ObjectId]) -> AppResult<Vec<User>>;
    /// Fails with `Conflict` when the email is already taken.
    async fn insert_user(&self, user: &User) -> AppResult<()>;
    /// Persists `confirmed` and `updated_at` only.
    async fn confirm_user(&self, user: &User) -> AppResult<()>;
    /// Persists the password hash and `updated_at` only.
    async fn save_user_password(&self, user: &User) -> AppResult<()>;
    /// Persists name, email and `updated_at` only. `Conflict` when the email is taken.
    async fn save_user_profile(&self, user: &User) -> AppResult<()>;
    async fn delete_user(&self, id: &ObjectId) -> AppResult<()>;

    // ==================== TOKENS ====================
    /// Fails with `Conflict` when another live token already has the same code.
    async fn insert_token(&self, token: &Token) -> AppResult<()>;
    /// Looks up a token created at or after `issued_after` without consuming it.
    async fn find_token(&self, value: &str, issued_after: BsonDateTime) -> AppResult<Option<Token>>;
    /// Atomically finds and deletes the token, so it can be redeemed once.
    async fn take_token(&self, value: &str, issued_after: BsonDateTime) -> AppResult<Option<Token>>;

    // ==================== PROJECTS ====================
    async fn insert_project(&self, project: &Project) -> AppResult<()>;
    async fn find_project(&self, id: &ObjectId) -> AppResult<Option<Project>>;
    /// Projects the user manages or belongs to.
    async fn find_projects_for_user(&self, user_id: &ObjectId) -> AppResult<Vec<Project>>;
    /// Persists name, client, description and `updated_at` only.
    async fn save_project_details(&self, project: &Project) -> AppResult<()>;
    async fn delete_project(&self, id: &ObjectId) -> AppResult<()>;
    async fn push_project_task(&self, project_id: &ObjectId, task_id: &ObjectId) -> AppResult<()>;
    async fn pull_project_task(&self, project_id: &ObjectId, task_id: &ObjectId) -> AppResult<()>;
    /// Returns `false` when the user was already in the team.
    async fn add_team_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> AppResult<bool>;
    /// Returns `false` when the user was not in the team.
    async fn remove_team_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> AppResult<bool>;

    // ==================== TASKS ====================
    async fn insert_task(&self, task: &Task) -> AppResult<()>;
    async fn find_task(&self, id: &ObjectId) -> AppResult<Option<Task>>;
    async fn find_tasks_for_project(&self, project_id: &ObjectId) -> AppResult<Vec<Task>>;
    /// Persists name, description and `updated_at` only.
    async fn save_task_details(&self, task: &Task) -> AppResult<()>;
    /// Sets the current status and appends the change to `completedBy`.
    async fn push_task_status(&self, task_id: &ObjectId, change: &StatusChange) -> AppResult<()>;
    async fn delete_task(&self, id: &ObjectId) -> AppResult<()>;
    async fn delete_tasks_for_project(&self, project_id: &ObjectId) -> AppResult<()>;
    async fn push_task_note(&self, task_id: &ObjectId, note_id: &ObjectId) -> AppResult<()>;
    async fn pull_task_note(&self, task_id: &ObjectId, note_id: &ObjectId) -> AppResult<()>;

    // ==================== NOTES ====================
    async fn insert_note(&self, note: &Note) -> AppResult<()>;
    async fn find_note(&self, id: &ObjectId) -> AppResult<Option<Note>>;
    async fn find_notes_for_task(&self, task_id: &ObjectId) -> AppResult<Vec<Note>>;
    async fn delete_note(&self, id: &ObjectId) -> AppResult<()>;
    async fn delete_notes_for_tasks(&self, task_ids: &[ObjectId]) -> AppResult<()>;
}

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::RwLock;

use super::Store;
use crate::models::{Note, Project, StatusChange, Task, Token, User};
use crate::utils::{AppError, AppResult};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    tokens: Vec<Token>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    notes: Vec<Note>,
}

/// In-process store with the same semantics as the MongoDB collections.
/// Vectors keep insertion order, which doubles as `createdAt` order.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `operation` fail with a database error.
    #[cfg(test)]
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(operation);
        }
    }

    #[cfg(test)]
    pub async fn token_count(&self) -> usize {
        self.data.read().await.tokens.len()
    }

    #[cfg(test)]
    pub async fn user_count(&self) -> usize {
        self.data.read().await.users.len()
    }

    #[cfg(test)]
    pub async fn note_exists(&self, id: &ObjectId) -> bool {
        self.data.read().await.notes.iter().any(|n| &n.id == id)
    }

    #[cfg(test)]
    pub async fn task_exists(&self, id: &ObjectId) -> bool {
        self.data.read().await.tasks.iter().any(|t| &t.id == id)
    }

    /// Backdates a token, for expiry checks.
    #[cfg(test)]
    pub async fn age_token(&self, value: &str, minutes: i64) {
        let mut data = self.data.write().await;
        for token in data.tokens.iter_mut().filter(|t| t.token == value) {
            token.created_at =
                BsonDateTime::from_millis(token.created_at.timestamp_millis() - minutes * 60_000);
        }
    }

    fn check(&self, operation: &str) -> AppResult<()> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| AppError::DatabaseError("memory store lock poisoned".into()))?;
        if failing.contains(operation) {
            return Err(AppError::DatabaseError(format!("{} failed", operation)));
        }
        Ok(())
    }
}

fn user_mut<'a>(users: &'a mut [User], id: &ObjectId) -> AppResult<&'a mut User> {
    users
        .iter_mut()
        .find(|u| &u.id == id)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

fn project_mut<'a>(projects: &'a mut [Project], id: &ObjectId) -> AppResult<&'a mut Project> {
    projects
        .iter_mut()
        .find(|p| &p.id == id)
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

fn task_mut<'a>(tasks: &'a mut [Task], id: &ObjectId) -> AppResult<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| &t.id == id)
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        self.check("ping")
    }

    // ==================== USERS ====================

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.check("find_user_by_email")?;
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: &ObjectId) -> AppResult<Option<User>> {
        self.check("find_user")?;
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| &u.id == id).cloned())
    }

    async fn find_users(&self, ids: &[ObjectId]) -> AppResult<Vec<User>> {
        self.check("find_users")?;
        let data = self.data.read().await;
        Ok(data.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn insert_user(&self, user: &User) -> AppResult<()> {
        self.check("insert_user")?;
        let mut data = self.data.write().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already in use".into()));
        }
        data.users.push(user.clone());
        Ok(())
    }

    async fn confirm_user(&self, user: &User) -> AppResult<()> {
        self.check("confirm_user")?;
        let mut data = self.data.write().await;
        let existing = user_mut(&mut data.users, &user.id)?;
        existing.confirmed = user.confirmed;
        existing.updated_at = user.updated_at;
        Ok(())
    }

    async fn save_user_password(&self, user: &User) -> AppResult<()> {
        self.check("save_user_password")?;
        let mut data = self.data.write().await;
        let existing = user_mut(&mut data.users, &user.id)?;
        existing.password = user.password.clone();
        existing.updated_at = user.updated_at;
        Ok(())
    }

    async fn save_user_profile(&self, user: &User) -> AppResult<()> {
        self.check("save_user_profile")?;
        let mut data = self.data.write().await;
        if data.users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(AppError::Conflict("Email already in use".into()));
        }
        let existing = user_mut(&mut data.users, &user.id)?;
        existing.name = user.name.clone();
        existing.email = user.email.clone();
        existing.updated_at = user.updated_at;
        Ok(())
    }

    async fn delete_user(&self, id: &ObjectId) -> AppResult<()> {
        self.check("delete_user")?;
        self.data.write().await.users.retain(|u| &u.id != id);
        Ok(())
    }

    // ==================== TOKENS ====================

    async fn insert_token(&self, token: &Token) -> AppResult<()> {
        self.check("insert_token")?;
        let mut data = self.data.write().await;
        if data.tokens.iter().any(|t| t.token == token.token) {
            return Err(AppError::Conflict("Token already in use".into()));
        }
        data.tokens.push(token.clone());
        Ok(())
    }

    async fn find_token(&self, value: &str, issued_after: BsonDateTime) -> AppResult<Option<Token>> {
        self.check("find_token")?;
        let data = self.data.read().await;
        Ok(data
            .tokens
            .iter()
            .find(|t| t.token == value && t.created_at >= issued_after)
            .cloned())
    }

    async fn take_token(&self, value: &str, issued_after: BsonDateTime) -> AppResult<Option<Token>> {
        self.check("take_token")?;
        let mut data = self.data.write().await;
        let position = data
            .tokens
            .iter()
            .position(|t| t.token == value && t.created_at >= issued_after);
        Ok(position.map(|index| data.tokens.remove(index)))
    }

    // ==================== PROJECTS ====================

    async fn insert_project(&self, project: &Project) -> AppResult<()> {
        self.check("insert_project")?;
        self.data.write().await.projects.push(project.clone());
        Ok(())
    }

    async fn find_project(&self, id: &ObjectId) -> AppResult<Option<Project>> {
        self.check("find_project")?;
        let data = self.data.read().await;
        Ok(data.projects.iter().find(|p| &p.id == id).cloned())
    }

    async fn find_projects_for_user(&self, user_id: &ObjectId) -> AppResult<Vec<Project>> {
        self.check("find_projects_for_user")?;
        let data = self.data.read().await;
        Ok(data
            .projects
            .iter()
            .filter(|p| p.can_access(user_id))
            .cloned()
            .collect())
    }

    async fn save_project_details(&self, project: &Project) -> AppResult<()> {
        self.check("save_project_details")?;
        let mut data = self.data.write().await;
        let existing = project_mut(&mut data.projects, &project.id)?;
        existing.project_name = project.project_name.clone();
        existing.client_name = project.client_name.clone();
        existing.description = project.description.clone();
        existing.updated_at = project.updated_at;
        Ok(())
    }

    async fn delete_project(&self, id: &ObjectId) -> AppResult<()> {
        self.check("delete_project")?;
        self.data.write().await.projects.retain(|p| &p.id != id);
        Ok(())
    }

    async fn push_project_task(&self, project_id: &ObjectId, task_id: &ObjectId) -> AppResult<()> {
        self.check("push_project_task")?;
        let mut data = self.data.write().await;
        project_mut(&mut data.projects, project_id)?.tasks.push(*task_id);
        Ok(())
    }

    async fn pull_project_task(&self, project_id: &ObjectId, task_id: &ObjectId) -> AppResult<()> {
        self.check("pull_project_task")?;
        let mut data = self.data.write().await;
        project_mut(&mut data.projects, project_id)?
            .tasks
            .retain(|id| id != task_id);
        Ok(())
    }

    async fn add_team_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> AppResult<bool> {
        self.check("add_team_member")?;
        let mut data = self.data.write().await;
        let project = project_mut(&mut data.projects, project_id)?;
        if project.team.contains(user_id) {
            return Ok(false);
        }
        project.team.push(*user_id);
        Ok(true)
    }

    async fn remove_team_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> AppResult<bool> {
        self.check("remove_team_member")?;
        let mut data = self.data.write().await;
        let project = project_mut(&mut data.projects, project_id)?;
        let before = project.team.len();
        project.team.retain(|id| id != user_id);
        Ok(project.team.len() != before)
    }

    // ==================== TASKS ====================

    async fn insert_task(&self, task: &Task) -> AppResult<()> {
        self.check("insert_task")?;
        self.data.write().await.tasks.push(task.clone());
        Ok(())
    }

    async fn find_task(&self, id: &ObjectId) -> AppResult<Option<Task>> {
        self.check("find_task")?;
        let data = self.data.read().await;
        Ok(data.tasks.iter().find(|t| &t.id == id).cloned())
    }

    async fn find_tasks_for_project(&self, project_id: &ObjectId) -> AppResult<Vec<Task>> {
        self.check("find_tasks_for_project")?;
        let data = self.data.read().await;
        Ok(data
            .tasks
            .iter()
            .filter(|t| &t.project == project_id)
            .cloned()
            .collect())
    }

    async fn save_task_details(&self, task: &Task) -> AppResult<()> {
        self.check("save_task_details")?;
        let mut data = self.data.write().await;
        let existing = task_mut(&mut data.tasks, &task.id)?;
        existing.name = task.name.clone();
        existing.description = task.description.clone();
        existing.updated_at = task.updated_at;
        Ok(())
    }

    async fn push_task_status(&self, task_id: &ObjectId, change: &StatusChange) -> AppResult<()> {
        self.check("push_task_status")?;
        let mut data = self.data.write().await;
        let task = task_mut(&mut data.tasks, task_id)?;
        task.status = change.status;
        task.updated_at = change.changed_at;
        task.completed_by.push(change.clone());
        Ok(())
    }

    async fn delete_task(&self, id: &ObjectId) -> AppResult<()> {
        self.check("delete_task")?;
        self.data.write().await.tasks.retain(|t| &t.id != id);
        Ok(())
    }

    async fn delete_tasks_for_project(&self, project_id: &ObjectId) -> AppResult<()> {
        self.check("delete_tasks_for_project")?;
        self.data
            .write()
            .await
            .tasks
            .retain(|t| &t.project != project_id);
        Ok(())
    }

    async fn push_task_note(&self, task_id: &ObjectId, note_id: &ObjectId) -> AppResult<()> {
        self.check("push_task_note")?;
        let mut data = self.data.write().await;
        task_mut(&mut data.tasks, task_id)?.notes.push(*note_id);
        Ok(())
    }

    async fn pull_task_note(&self, task_id: &ObjectId, note_id: &ObjectId) -> AppResult<()> {
        self.check("pull_task_note")?;
        let mut data = self.data.write().await;
        task_mut(&mut data.tasks, task_id)?
            .notes
            .retain(|id| id != note_id);
        Ok(())
    }

    // ==================== NOTES ====================

    async fn insert_note(&self, note: &Note) -> AppResult<()> {
        self.check("insert_note")?;
        self.data.write().await.notes.push(note.clone());
        Ok(())
    }

    async fn find_note(&self, id: &ObjectId) -> AppResult<Option<Note>> {
        self.check("find_note")?;
        let data = self.data.read().await;
        Ok(data.notes.iter().find(|n| &n.id == id).cloned())
    }

    async fn find_notes_for_task(&self, task_id: &ObjectId) -> AppResult<Vec<Note>> {
        self.check("find_notes_for_task")?;
        let data = self.data.read().await;
        Ok(data
            .notes
            .iter()
            .filter(|n| &n.task == task_id)
            .cloned()
            .collect())
    }

    async fn delete_note(&self, id: &ObjectId) -> AppResult<()> {
        self.check("delete_note")?;
        self.data.write().await.notes.retain(|n| &n.id != id);
        Ok(())
    }

    async fn delete_notes_for_tasks(&self, task_ids: &[ObjectId]) -> AppResult<()> {
        self.check("delete_notes_for_tasks")?;
        self.data
            .write()
            .await
            .notes
            .retain(|n| !task_ids.contains(&n.task));
        Ok(())
    }
}

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::results::UpdateResult;

use super::{MongoDB, Store, NOTES, PROJECTS, TASKS, TOKENS, USERS};
use crate::models::{Note, Project, StatusChange, Task, Token, User};
use crate::utils::{is_duplicate_key, AppError, AppResult};

fn ensure_matched(result: &UpdateResult, what: &str) -> AppResult<()> {
    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!("{} not found", what)));
    }
    Ok(())
}

#[async_trait]
impl Store for MongoDB {
    async fn ping(&self) -> AppResult<()> {
        self.database().run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    // ==================== USERS ====================

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "email": email })
            .await?)
    }

    async fn find_user(&self, id: &ObjectId) -> AppResult<Option<User>> {
        Ok(self.collection::<User>(USERS).find_one(doc! { "_id": *id }).await?)
    }

    async fn find_users(&self, ids: &[ObjectId]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection::<User>(USERS)
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_user(&self, user: &User) -> AppResult<()> {
        // Violação do índice único vira 409 no From<mongodb::error::Error>
        self.collection::<User>(USERS).insert_one(user).await?;
        Ok(())
    }

    async fn confirm_user(&self, user: &User) -> AppResult<()> {
        let result = self
            .collection::<User>(USERS)
            .update_one(
                doc! { "_id": user.id },
                doc! { "$set": { "confirmed": user.confirmed, "updatedAt": user.updated_at } },
            )
            .await?;
        ensure_matched(&result, "User")
    }

    async fn save_user_password(&self, user: &User) -> AppResult<()> {
        let result = self
            .collection::<User>(USERS)
            .update_one(
                doc! { "_id": user.id },
                doc! { "$set": { "password": user.password.as_str(), "updatedAt": user.updated_at } },
            )
            .await?;
        ensure_matched(&result, "User")
    }

    async fn save_user_profile(&self, user: &User) -> AppResult<()> {
        let result = self
            .collection::<User>(USERS)
            .update_one(
                doc! { "_id": user.id },
                doc! { "$set": {
                    "name": user.name.as_str(),
                    "email": user.email.as_str(),
                    "updatedAt": user.updated_at,
                } },
            )
            .await?;
        ensure_matched(&result, "User")
    }

    async fn delete_user(&self, id: &ObjectId) -> AppResult<()> {
        self.collection::<User>(USERS).delete_one(doc! { "_id": *id }).await?;
        Ok(())
    }

    // ==================== TOKENS ====================

    async fn insert_token(&self, token: &Token) -> AppResult<()> {
        match self.collection::<Token>(TOKENS).insert_one(token).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict("Token already in use".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_token(&self, value: &str, issued_after: BsonDateTime) -> AppResult<Option<Token>> {
        Ok(self
            .collection::<Token>(TOKENS)
            .find_one(doc! { "token": value, "createdAt": { "$gte": issued_after } })
            .await?)
    }

    async fn take_token(&self, value: &str, issued_after: BsonDateTime) -> AppResult<Option<Token>> {
        Ok(self
            .collection::<Token>(TOKENS)
            .find_one_and_delete(doc! { "token": value, "createdAt": { "$gte": issued_after } })
            .await?)
    }

    // ==================== PROJECTS ====================

    async fn insert_project(&self, project: &Project) -> AppResult<()> {
        self.collection::<Project>(PROJECTS).insert_one(project).await?;
        Ok(())
    }

    async fn find_project(&self, id: &ObjectId) -> AppResult<Option<Project>> {
        Ok(self
            .collection::<Project>(PROJECTS)
            .find_one(doc! { "_id": *id })
            .await?)
    }

    async fn find_projects_for_user(&self, user_id: &ObjectId) -> AppResult<Vec<Project>> {
        let cursor = self
            .collection::<Project>(PROJECTS)
            .find(doc! { "$or": [ { "manager": *user_id }, { "team": *user_id } ] })
            .sort(doc! { "createdAt": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn save_project_details(&self, project: &Project) -> AppResult<()> {
        let result = self
            .collection::<Project>(PROJECTS)
            .update_one(
                doc! { "_id": project.id },
                doc! { "$set": {
                    "projectName": project.project_name.as_str(),
                    "clientName": project.client_name.as_str(),
                    "description": project.description.as_str(),
                    "updatedAt": project.updated_at,
                } },
            )
            .await?;
        ensure_matched(&result, "Project")
    }

    async fn delete_project(&self, id: &ObjectId) -> AppResult<()> {
        self.collection::<Project>(PROJECTS)
            .delete_one(doc! { "_id": *id })
            .await?;
        Ok(())
    }

    async fn push_project_task(&self, project_id: &ObjectId, task_id: &ObjectId) -> AppResult<()> {
        let result = self
            .collection::<Project>(PROJECTS)
            .update_one(doc! { "_id": *project_id }, doc! { "$push": { "tasks": *task_id } })
            .await?;
        ensure_matched(&result, "Project")
    }

    async fn pull_project_task(&self, project_id: &ObjectId, task_id: &ObjectId) -> AppResult<()> {
        let result = self
            .collection::<Project>(PROJECTS)
            .update_one(doc! { "_id": *project_id }, doc! { "$pull": { "tasks": *task_id } })
            .await?;
        ensure_matched(&result, "Project")
    }

    async fn add_team_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> AppResult<bool> {
        let result = self
            .collection::<Project>(PROJECTS)
            .update_one(doc! { "_id": *project_id }, doc! { "$addToSet": { "team": *user_id } })
            .await?;
        ensure_matched(&result, "Project")?;
        Ok(result.modified_count > 0)
    }

    async fn remove_team_member(&self, project_id: &ObjectId, user_id: &ObjectId) -> AppResult<bool> {
        let result = self
            .collection::<Project>(PROJECTS)
            .update_one(doc! { "_id": *project_id }, doc! { "$pull": { "team": *user_id } })
            .await?;
        ensure_matched(&result, "Project")?;
        Ok(result.modified_count > 0)
    }

    // ==================== TASKS ====================

    async fn insert_task(&self, task: &Task) -> AppResult<()> {
        self.collection::<Task>(TASKS).insert_one(task).await?;
        Ok(())
    }

    async fn find_task(&self, id: &ObjectId) -> AppResult<Option<Task>> {
        Ok(self.collection::<Task>(TASKS).find_one(doc! { "_id": *id }).await?)
    }

    async fn find_tasks_for_project(&self, project_id: &ObjectId) -> AppResult<Vec<Task>> {
        let cursor = self
            .collection::<Task>(TASKS)
            .find(doc! { "project": *project_id })
            .sort(doc! { "createdAt": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn save_task_details(&self, task: &Task) -> AppResult<()> {
        let result = self
            .collection::<Task>(TASKS)
            .update_one(
                doc! { "_id": task.id },
                doc! { "$set": {
                    "name": task.name.as_str(),
                    "description": task.description.as_str(),
                    "updatedAt": task.updated_at,
                } },
            )
            .await?;
        ensure_matched(&result, "Task")
    }

    async fn push_task_status(&self, task_id: &ObjectId, change: &StatusChange) -> AppResult<()> {
        let entry = mongodb::bson::to_bson(change)
            .map_err(|e| AppError::DatabaseError(format!("Failed to encode status change: {}", e)))?;
        let result = self
            .collection::<Task>(TASKS)
            .update_one(
                doc! { "_id": *task_id },
                doc! {
                    "$set": { "status": change.status.to_string(), "updatedAt": change.changed_at },
                    "$push": { "completedBy": entry },
                },
            )
            .await?;
        ensure_matched(&result, "Task")
    }

    async fn delete_task(&self, id: &ObjectId) -> AppResult<()> {
        self.collection::<Task>(TASKS).delete_one(doc! { "_id": *id }).await?;
        Ok(())
    }

    async fn delete_tasks_for_project(&self, project_id: &ObjectId) -> AppResult<()> {
        self.collection::<Task>(TASKS)
            .delete_many(doc! { "project": *project_id })
            .await?;
        Ok(())
    }

    async fn push_task_note(&self, task_id: &ObjectId, note_id: &ObjectId) -> AppResult<()> {
        let result = self
            .collection::<Task>(TASKS)
            .update_one(doc! { "_id": *task_id }, doc! { "$push": { "notes": *note_id } })
            .await?;
        ensure_matched(&result, "Task")
    }

    async fn pull_task_note(&self, task_id: &ObjectId, note_id: &ObjectId) -> AppResult<()> {
        let result = self
            .collection::<Task>(TASKS)
            .update_one(doc! { "_id": *task_id }, doc! { "$pull": { "notes": *note_id } })
            .await?;
        ensure_matched(&result, "Task")
    }

    // ==================== NOTES ====================

    async fn insert_note(&self, note: &Note) -> AppResult<()> {
        self.collection::<Note>(NOTES).insert_one(note).await?;
        Ok(())
    }

    async fn find_note(&self, id: &ObjectId) -> AppResult<Option<Note>> {
        Ok(self.collection::<Note>(NOTES).find_one(doc! { "_id": *id }).await?)
    }

    async fn find_notes_for_task(&self, task_id: &ObjectId) -> AppResult<Vec<Note>> {
        let cursor = self
            .collection::<Note>(NOTES)
            .find(doc! { "task": *task_id })
            .sort(doc! { "createdAt": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_note(&self, id: &ObjectId) -> AppResult<()> {
        self.collection::<Note>(NOTES).delete_one(doc! { "_id": *id }).await?;
        Ok(())
    }

    async fn delete_notes_for_tasks(&self, task_ids: &[ObjectId]) -> AppResult<()> {
        if task_ids.is_empty() {
            return Ok(());
        }
        self.collection::<Note>(NOTES)
            .delete_many(doc! { "task": { "$in": task_ids.to_vec() } })
            .await?;
        Ok(())
    }
}

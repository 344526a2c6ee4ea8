use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::UserSummary;

/// Nota de uma tarefa (collection "notes")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub created_by: ObjectId,
    pub task: ObjectId,
    pub created_at: i64,
}

impl Note {
    pub fn new(content: &str, created_by: ObjectId, task: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            content: content.trim().to_string(),
            created_by,
            task,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Note content is required"))]
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub content: String,
    pub created_by: Option<UserSummary>,
    pub task: String,
    pub created_at: i64,
}

impl NoteResponse {
    pub fn new(note: Note, author: Option<UserSummary>) -> Self {
        NoteResponse {
            id: note.id.to_hex(),
            content: note.content,
            created_by: author,
            task: note.task.to_hex(),
            created_at: note.created_at,
        }
    }
}

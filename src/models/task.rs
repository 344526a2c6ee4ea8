use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::note::NoteResponse;
use super::user::UserSummary;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Pending,
    OnHold,
    InProgress,
    UnderReview,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::OnHold => "onHold",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::UnderReview => "underReview",
            TaskStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// Entrada do histórico de status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub user: ObjectId,
    pub status: TaskStatus,
    pub changed_at: i64,
}

/// Tarefa (collection "tasks")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,

    /// Projeto dono da tarefa
    pub project: ObjectId,

    #[serde(default)]
    pub completed_by: Vec<StatusChange>,

    #[serde(default)]
    pub notes: Vec<ObjectId>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn new(request: &TaskRequest, project: ObjectId) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: ObjectId::new(),
            name: request.name.trim().to_string(),
            description: request.description.trim().to_string(),
            status: TaskStatus::Pending,
            project,
            completed_by: Vec::new(),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the status and appends who changed it to the history log.
    pub fn record_status(&mut self, user: ObjectId, status: TaskStatus) {
        let now = chrono::Utc::now().timestamp();
        self.status = status;
        self.completed_by.push(StatusChange {
            user,
            status,
            changed_at: now,
        });
        self.updated_at = now;
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Task name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Task description is required"))]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub user: String,
    pub status: TaskStatus,
    pub changed_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub project: String,
    pub completed_by: Vec<StatusChangeResponse>,
    pub notes: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        TaskResponse {
            id: task.id.to_hex(),
            name: task.name,
            description: task.description,
            status: task.status,
            project: task.project.to_hex(),
            completed_by: task
                .completed_by
                .into_iter()
                .map(|change| StatusChangeResponse {
                    user: change.user.to_hex(),
                    status: change.status,
                    changed_at: change.changed_at,
                })
                .collect(),
            notes: task.notes.iter().map(|id| id.to_hex()).collect(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeDetail {
    /// `None` when the user no longer exists
    pub user: Option<UserSummary>,
    pub status: TaskStatus,
    pub changed_at: i64,
}

/// Tarefa com usuários do histórico e notas carregados
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub project: String,
    pub completed_by: Vec<StatusChangeDetail>,
    pub notes: Vec<NoteResponse>,
    pub created_at: i64,
    pub updated_at: i64,
}

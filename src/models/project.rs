use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::task::TaskResponse;

/// Projeto (collection "projects")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub project_name: String,
    pub client_name: String,
    pub description: String,

    /// Dono do projeto
    pub manager: ObjectId,

    /// Membros convidados (sem duplicatas)
    #[serde(default)]
    pub team: Vec<ObjectId>,

    /// Ids das tarefas, na ordem de criação
    #[serde(default)]
    pub tasks: Vec<ObjectId>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Project {
    pub fn new(request: &ProjectRequest, manager: ObjectId) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: ObjectId::new(),
            project_name: request.project_name.trim().to_string(),
            client_name: request.client_name.trim().to_string(),
            description: request.description.trim().to_string(),
            manager,
            team: Vec::new(),
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_manager(&self, user_id: &ObjectId) -> bool {
        &self.manager == user_id
    }

    pub fn is_member(&self, user_id: &ObjectId) -> bool {
        self.team.contains(user_id)
    }

    pub fn can_access(&self, user_id: &ObjectId) -> bool {
        self.is_manager(user_id) || self.is_member(user_id)
    }
}

/// Body de criação/atualização de projeto
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Project name is required"))]
    pub project_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Project description is required"))]
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub project_name: String,
    pub client_name: String,
    pub description: String,
    pub manager: String,
    pub team: Vec<String>,
    pub tasks: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        ProjectResponse {
            id: project.id.to_hex(),
            project_name: project.project_name,
            client_name: project.client_name,
            description: project.description,
            manager: project.manager.to_hex(),
            team: project.team.iter().map(|id| id.to_hex()).collect(),
            tasks: project.tasks.iter().map(|id| id.to_hex()).collect(),
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Projeto com as tarefas carregadas
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailResponse {
    pub id: String,
    pub project_name: String,
    pub client_name: String,
    pub description: String,
    pub manager: String,
    pub team: Vec<String>,
    pub tasks: Vec<TaskResponse>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProjectDetailResponse {
    pub fn new(project: Project, tasks: Vec<TaskResponse>) -> Self {
        ProjectDetailResponse {
            id: project.id.to_hex(),
            project_name: project.project_name,
            client_name: project.client_name,
            description: project.description,
            manager: project.manager.to_hex(),
            team: project.team.iter().map(|id| id.to_hex()).collect(),
            tasks,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

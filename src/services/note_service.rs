use mongodb::bson::oid::ObjectId;

use crate::models::{Note, NoteRequest, NoteResponse, UserSummary};
use crate::services::access::{accessible_project, project_task};
use crate::services::task_service::user_summaries;
use crate::state::AppState;
use crate::utils::validation::{parse_object_id, validate_request};
use crate::utils::{AppError, AppResult};

pub async fn create_note(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    task_id: &str,
    request: &NoteRequest,
) -> AppResult<NoteResponse> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let task = project_task(state.store.as_ref(), &project, task_id).await?;
    validate_request(request)?;

    let note = Note::new(&request.content, *user_id, task.id);
    state.store.insert_note(&note).await?;

    if let Err(e) = state.store.push_task_note(&task.id, &note.id).await {
        log::error!("❌ Could not attach note {} to task {}: {}", note.id, task.id, e);
        if let Err(undo) = state.store.delete_note(&note.id).await {
            log::error!("❌ Orphan note {} left behind: {}", note.id, undo);
        }
        return Err(e);
    }

    let author = state.store.find_user(user_id).await?.map(|u| UserSummary::from(&u));
    Ok(NoteResponse::new(note, author))
}

pub async fn list_notes(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    task_id: &str,
) -> AppResult<Vec<NoteResponse>> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let task = project_task(state.store.as_ref(), &project, task_id).await?;

    let notes = state.store.find_notes_for_task(&task.id).await?;
    let authors: Vec<ObjectId> = notes.iter().map(|n| n.created_by).collect();
    let users = user_summaries(state, &authors).await?;

    Ok(notes
        .into_iter()
        .map(|note| {
            let author = users.get(&note.created_by).cloned();
            NoteResponse::new(note, author)
        })
        .collect())
}

/// Only the author may delete a note
pub async fn delete_note(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    task_id: &str,
    note_id: &str,
) -> AppResult<()> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let task = project_task(state.store.as_ref(), &project, task_id).await?;
    let note_id = parse_object_id("note_id", note_id)?;

    let note = state
        .store
        .find_note(&note_id)
        .await?
        .filter(|n| n.task == task.id)
        .ok_or_else(|| AppError::NotFound("Note not found".into()))?;

    if &note.created_by != user_id {
        return Err(AppError::Forbidden("Only the author can delete this note".into()));
    }

    state.store.pull_task_note(&task.id, &note.id).await?;
    if let Err(e) = state.store.delete_note(&note.id).await {
        log::error!("❌ Note {} delete failed, re-attaching: {}", note.id, e);
        if let Err(undo) = state.store.push_task_note(&task.id, &note.id).await {
            log::error!("❌ Could not re-attach note {}: {}", note.id, undo);
        }
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::{MemoryStore, Store};
    use crate::models::{Project, ProjectRequest, Task, TaskRequest, User};
    use crate::services::email_service::LogMailer;
    use std::sync::Arc;

    struct Fixture {
        state: AppState,
        store: Arc<MemoryStore>,
        manager: ObjectId,
        member: ObjectId,
        project: String,
        task: Task,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), Arc::new(LogMailer), Config::for_tests());
        let manager = User::new("Manager", "manager@example.com", "x".into());
        let member = User::new("Member", "member@example.com", "x".into());
        store.insert_user(&manager).await.unwrap();
        store.insert_user(&member).await.unwrap();

        let mut project = Project::new(
            &ProjectRequest {
                project_name: "P".into(),
                client_name: "C".into(),
                description: "D".into(),
            },
            manager.id,
        );
        project.team.push(member.id);
        store.insert_project(&project).await.unwrap();

        let task = Task::new(
            &TaskRequest {
                name: "T".into(),
                description: "D".into(),
            },
            project.id,
        );
        store.insert_task(&task).await.unwrap();
        store.push_project_task(&project.id, &task.id).await.unwrap();

        Fixture {
            state,
            store,
            manager: manager.id,
            member: member.id,
            project: project.id.to_hex(),
            task,
        }
    }

    fn content(text: &str) -> NoteRequest {
        NoteRequest { content: text.into() }
    }

    #[tokio::test]
    async fn test_create_note_links_task_and_author() {
        let f = fixture().await;
        let tid = f.task.id.to_hex();
        let note = create_note(&f.state, &f.member, &f.project, &tid, &content("Looks good"))
            .await
            .unwrap();
        assert_eq!(note.created_by.unwrap().email, "member@example.com");

        let task = f.store.find_task(&f.task.id).await.unwrap().unwrap();
        assert_eq!(task.notes.len(), 1);

        let listed = list_notes(&f.state, &f.manager, &f.project, &tid).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "Looks good");
    }

    #[tokio::test]
    async fn test_create_note_rolls_back() {
        let f = fixture().await;
        f.store.fail_on("push_task_note");
        let tid = f.task.id.to_hex();

        assert!(create_note(&f.state, &f.member, &f.project, &tid, &content("x"))
            .await
            .is_err());
        assert!(f.store.find_notes_for_task(&f.task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_author_deletes() {
        let f = fixture().await;
        let tid = f.task.id.to_hex();
        let note = create_note(&f.state, &f.member, &f.project, &tid, &content("mine"))
            .await
            .unwrap();

        assert!(matches!(
            delete_note(&f.state, &f.manager, &f.project, &tid, &note.id).await,
            Err(AppError::Forbidden(_))
        ));
        delete_note(&f.state, &f.member, &f.project, &tid, &note.id).await.unwrap();

        let task = f.store.find_task(&f.task.id).await.unwrap().unwrap();
        assert!(task.notes.is_empty());
        assert!(matches!(
            delete_note(&f.state, &f.member, &f.project, &tid, &note.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_note_relinks_on_failure() {
        let f = fixture().await;
        let tid = f.task.id.to_hex();
        let note = create_note(&f.state, &f.member, &f.project, &tid, &content("keep"))
            .await
            .unwrap();

        f.store.fail_on("delete_note");
        assert!(delete_note(&f.state, &f.member, &f.project, &tid, &note.id).await.is_err());

        let task = f.store.find_task(&f.task.id).await.unwrap().unwrap();
        assert_eq!(task.notes.len(), 1);
    }
}

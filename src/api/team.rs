use actix_web::{delete, get, post, web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::services::access::current_user;
use crate::services::team_service::{self, FindMemberRequest, MemberIdRequest};
use crate::state::AppState;
use crate::utils::AppResult;

#[post("/{project_id}/team/find")]
pub async fn find_member(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<FindMemberRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let member = team_service::find_member_by_email(&state, &user.id, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": member
    })))
}

#[get("/{project_id}/team")]
pub async fn list_team(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let team = team_service::list_team(&state, &user.id, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "team": team
    })))
}

#[post("/{project_id}/team")]
pub async fn add_member(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<MemberIdRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    team_service::add_member(&state, &user.id, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User added to the project"
    })))
}

#[delete("/{project_id}/team/{user_id}")]
pub async fn remove_member(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, member_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    team_service::remove_member(&state, &user.id, &project_id, &member_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User removed from the project"
    })))
}

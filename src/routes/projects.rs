use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Participant, Project};
use crate::recent;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddParticipant {
    pub username: String,
}

#[derive(Serialize)]
pub struct ProjectBrowser {
    pub recent: Vec<Project>,
    pub owned: Vec<Project>,
    pub participating: Vec<Project>,
}

#[derive(Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub participants: Vec<Participant>,
}

/// Session-scoped on purpose: the queue resets with the browser session.
fn recency_cookie(name: String, ids: String) -> Cookie<'static> {
    Cookie::build((name, ids))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn browse(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<Json<ProjectBrowser>, AppError> {
    let owned = db::projects::list_owned(&state.pool, auth.user_id).await?;
    let participating = db::projects::list_participating(&state.pool, auth.user_id).await?;
    let accessible = db::projects::list_accessible(&state.pool, auth.user_id).await?;

    let cookie_name = recent::cookie_name(&auth.username);
    let recent_ids = recent::parse(jar.get(&cookie_name).map(|c| c.value()));
    let recent = recent::resolve_visible(&recent_ids, &accessible);

    Ok(Json(ProjectBrowser {
        recent,
        owned,
        participating,
    }))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<Json<Project>, AppError> {
    validate_name(&req.name)?;
    validate_description(req.description.as_deref())?;

    let project = db::projects::create(
        &state.pool,
        &req.name,
        req.description.as_deref(),
        auth.user_id,
    )
    .await?
    .ok_or(AppError::CreationFailed)?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.created",
        "project",
        Some(&project.id),
        None,
    )
    .await;

    Ok(Json(project))
}

pub async fn show(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ProjectDetail>), AppError> {
    let project = db::projects::find_by_id(&state.pool, &id).await?;

    let participants = match project.as_ref() {
        Some(p) => db::projects::participants(&state.pool, &p.id).await?,
        None => Vec::new(),
    };
    let participant_ids: Vec<Uuid> = participants.iter().map(|p| p.id).collect();

    // Missing and inaccessible answer identically
    let project = match project {
        Some(p) if access::can_view(auth.user_id, Some(&p), &participant_ids) => p,
        _ => return Err(AppError::project_not_found()),
    };

    let cookie_name = recent::cookie_name(&auth.username);
    let current = recent::parse(jar.get(&cookie_name).map(|c| c.value()));
    let rotated = recent::touch(current, &project.id);
    let jar = jar.add(recency_cookie(cookie_name, recent::serialize(&rotated)));

    Ok((
        jar,
        Json(ProjectDetail {
            project,
            participants,
        }),
    ))
}

pub async fn add_participant(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<AddParticipant>,
) -> Result<Json<Vec<Participant>>, AppError> {
    let project = db::projects::find_by_id(&state.pool, &id).await?;

    let participants = match project.as_ref() {
        Some(p) => db::projects::participants(&state.pool, &p.id).await?,
        None => Vec::new(),
    };
    let participant_ids: Vec<Uuid> = participants.iter().map(|p| p.id).collect();

    let project = match project {
        Some(p) if access::can_view(auth.user_id, Some(&p), &participant_ids) => p,
        _ => return Err(AppError::project_not_found()),
    };

    if project.owner_id != auth.user_id {
        return Err(AppError::Forbidden(
            "Only the project owner can add participants".to_string(),
        ));
    }

    let user = db::users::find_by_username(&state.pool, &req.username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    db::projects::add_participant(&state.pool, &project.id, user.id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.participant_added",
        "project",
        Some(&project.id),
        Some(serde_json::json!({ "username": user.username })),
    )
    .await;

    let participants = db::projects::participants(&state.pool, &project.id).await?;
    Ok(Json(participants))
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.chars().count() < 4 {
        return Err(AppError::BadRequest(
            "Project name must be at least 4 characters long.".to_string(),
        ));
    }
    if name.chars().count() > 255 {
        return Err(AppError::BadRequest(
            "Project name cannot be longer than 255 characters.".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    if let Some(description) = description {
        if description.chars().count() > 2048 {
            return Err(AppError::BadRequest(
                "Project description cannot be longer than 2048 characters.".to_string(),
            ));
        }
    }
    Ok(())
}

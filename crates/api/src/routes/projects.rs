//! Project and team routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use obra_core::project::{ProjectInput, ProjectPermission, ProjectService, TeamMemberInput};
use obra_db::ProjectRepository;
use obra_db::entities::{project_team, projects};
use obra_shared::types::{PageRequest, PageResponse};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::authorize;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the project routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            "/projects/{project_id}/team",
            get(list_team).post(upsert_team_member),
        )
}

/// Project with derived schedule figures.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    /// Stored fields.
    #[serde(flatten)]
    pub project: projects::Model,
    /// Whether the project is under construction.
    pub is_active: bool,
    /// Planned or actual duration in days.
    pub duration_days: i64,
    /// Days until the planned end.
    pub days_remaining: i64,
}

impl ProjectResponse {
    fn new(project: projects::Model, today: NaiveDate) -> Self {
        let domain = project.to_domain();
        Self {
            is_active: domain.is_active(),
            duration_days: domain.duration_days(),
            days_remaining: domain.days_remaining(today),
            project,
        }
    }
}

async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<ProjectResponse>>, ApiError> {
    let page = PageRequest::new(page.page, page.per_page);
    let today = state.business.today();

    let projects = ProjectRepository::new((*state.db).clone())
        .list_for_user(auth.user_id(), auth.is_staff(), &page)
        .await?;

    Ok(Json(projects.map(|p| ProjectResponse::new(p, today))))
}

async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ProjectInput>,
) -> Result<impl IntoResponse, ApiError> {
    ProjectService::validate_project(&input)?;

    let project = ProjectRepository::new((*state.db).clone())
        .create_project(input, auth.user_id())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::new(project, state.business.today())),
    ))
}

async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let project = ProjectRepository::new((*state.db).clone())
        .get_project(project_id)
        .await?;

    Ok(Json(ProjectResponse::new(project, state.business.today())))
}

async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<ProjectResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::Edit).await?;
    ProjectService::validate_project(&input)?;

    let project = ProjectRepository::new((*state.db).clone())
        .update_project(project_id, input)
        .await?;

    info!(%project_id, user_id = %auth.user_id(), "Project updated");
    Ok(Json(ProjectResponse::new(project, state.business.today())))
}

async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::Delete).await?;

    ProjectRepository::new((*state.db).clone())
        .delete_project(project_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<project_team::Model>>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let team = ProjectRepository::new((*state.db).clone())
        .list_team(project_id)
        .await?;

    Ok(Json(team))
}

async fn upsert_team_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<TeamMemberInput>,
) -> Result<Json<project_team::Model>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ManageTeam).await?;
    ProjectService::validate_team_member(&input)?;

    let member = ProjectRepository::new((*state.db).clone())
        .upsert_team_member(project_id, input)
        .await?;

    Ok(Json(member))
}

//! Project repository for projects and their team.

use chrono::Utc;
use obra_core::project::{Membership, ProjectInput, ProjectService, TeamMemberInput, TeamRole};
use obra_shared::types::{PageRequest, PageResponse};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{project_team, projects};

/// Error types for project operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// Project not found.
    #[error("Project not found: {0}")]
    NotFound(Uuid),

    /// Another project already uses the code.
    #[error("A project with code {0} already exists")]
    DuplicateCode(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Project repository for CRUD operations and membership lookups.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: DatabaseConnection,
}

impl ProjectRepository {
    /// Creates a new project repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a project and assigns the creator as its manager.
    ///
    /// The input must already have passed `ProjectService::validate_project`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken (case-insensitive).
    pub async fn create_project(
        &self,
        input: ProjectInput,
        created_by: Uuid,
    ) -> Result<projects::Model, ProjectError> {
        let code = input.code.trim().to_string();
        if self.code_exists(&code, None).await? {
            return Err(ProjectError::DuplicateCode(code));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now().into();
        let project_id = Uuid::now_v7();

        let project = projects::ActiveModel {
            id: Set(project_id),
            code: Set(code),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            client_name: Set(input.client_name.trim().to_string()),
            client_company: Set(input.client_company),
            location: Set(input.location.trim().to_string()),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            actual_start_date: Set(input.actual_start_date),
            actual_end_date: Set(input.actual_end_date),
            contract_amount: Set(input.contract_amount),
            contract_type: Set(input.contract_type.into()),
            budget: Set(input.budget),
            status: Set(input.status.into()),
            progress: Set(input.progress),
            project_manager: Set(input.project_manager.map(|u| u.into_inner())),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        project_team::ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            user_id: Set(created_by),
            role: Set(TeamRole::Manager.into()),
            start_date: Set(input.start_date),
            end_date: Set(None),
            is_active: Set(true),
            can_approve_payments: Set(true),
            can_manage_payroll: Set(true),
            can_view_financials: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(project_id = %project.id, code = %project.code, "Project created");
        Ok(project)
    }

    /// Replaces the editable fields of a project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `DuplicateCode`.
    pub async fn update_project(
        &self,
        project_id: Uuid,
        input: ProjectInput,
    ) -> Result<projects::Model, ProjectError> {
        let project = self.get_project(project_id).await?;
        let code = input.code.trim().to_string();
        if self.code_exists(&code, Some(project_id)).await? {
            return Err(ProjectError::DuplicateCode(code));
        }

        let mut active: projects::ActiveModel = project.into();
        active.code = Set(code);
        active.name = Set(input.name.trim().to_string());
        active.description = Set(input.description);
        active.client_name = Set(input.client_name.trim().to_string());
        active.client_company = Set(input.client_company);
        active.location = Set(input.location.trim().to_string());
        active.start_date = Set(input.start_date);
        active.end_date = Set(input.end_date);
        active.actual_start_date = Set(input.actual_start_date);
        active.actual_end_date = Set(input.actual_end_date);
        active.contract_amount = Set(input.contract_amount);
        active.contract_type = Set(input.contract_type.into());
        active.budget = Set(input.budget);
        active.status = Set(input.status.into());
        active.progress = Set(input.progress);
        active.project_manager = Set(input.project_manager.map(|u| u.into_inner()));
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Gets a project by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the project does not exist.
    pub async fn get_project(&self, project_id: Uuid) -> Result<projects::Model, ProjectError> {
        projects::Entity::find_by_id(project_id)
            .one(&self.db)
            .await?
            .ok_or(ProjectError::NotFound(project_id))
    }

    /// Lists the projects a user created or is an active member of.
    /// Staff users see every project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        is_staff: bool,
        page: &PageRequest,
    ) -> Result<PageResponse<projects::Model>, ProjectError> {
        let mut query = projects::Entity::find().order_by_desc(projects::Column::CreatedAt);

        if !is_staff {
            let member_of = project_team::Entity::find()
                .select_only()
                .column(project_team::Column::ProjectId)
                .filter(project_team::Column::UserId.eq(user_id))
                .filter(project_team::Column::IsActive.eq(true))
                .into_query();
            query = query.filter(
                Condition::any()
                    .add(projects::Column::CreatedBy.eq(user_id))
                    .add(projects::Column::Id.in_subquery(member_of)),
            );
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.page_index()).await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Resolves the caller's standing in a project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the project does not exist.
    pub async fn membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        is_staff: bool,
    ) -> Result<Membership, ProjectError> {
        let project = self.get_project(project_id).await?;

        let assignment = project_team::Entity::find()
            .filter(project_team::Column::ProjectId.eq(project_id))
            .filter(project_team::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(Membership {
            is_creator: project.created_by == user_id,
            is_staff,
            ..assignment
                .map(|a| a.membership())
                .unwrap_or_default()
        })
    }

    /// Lists the team of a project, active members first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_team(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<project_team::Model>, ProjectError> {
        Ok(project_team::Entity::find()
            .filter(project_team::Column::ProjectId.eq(project_id))
            .order_by_desc(project_team::Column::IsActive)
            .order_by_asc(project_team::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Adds a member or updates the existing assignment of the same user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the project does not exist.
    pub async fn upsert_team_member(
        &self,
        project_id: Uuid,
        input: TeamMemberInput,
    ) -> Result<project_team::Model, ProjectError> {
        let project = self.get_project(project_id).await?;
        let user_id = input.user_id.into_inner();
        let now = Utc::now().into();

        let existing = project_team::Entity::find()
            .filter(project_team::Column::ProjectId.eq(project_id))
            .filter(project_team::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let model = if let Some(row) = existing {
            let mut active: project_team::ActiveModel = row.into();
            active.role = Set(input.role.into());
            if let Some(start) = input.start_date {
                active.start_date = Set(start);
            }
            active.end_date = Set(input.end_date);
            active.is_active = Set(input.is_active);
            active.can_approve_payments = Set(input.can_approve_payments);
            active.can_manage_payroll = Set(input.can_manage_payroll);
            active.can_view_financials = Set(input.can_view_financials);
            active.updated_at = Set(now);
            active.update(&self.db).await?
        } else {
            project_team::ActiveModel {
                id: Set(Uuid::now_v7()),
                project_id: Set(project_id),
                user_id: Set(user_id),
                role: Set(input.role.into()),
                start_date: Set(input.start_date.unwrap_or(project.start_date)),
                end_date: Set(input.end_date),
                is_active: Set(input.is_active),
                can_approve_payments: Set(input.can_approve_payments),
                can_manage_payroll: Set(input.can_manage_payroll),
                can_view_financials: Set(input.can_view_financials),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await?
        };

        tracing::info!(%project_id, %user_id, role = ?model.role, "Team member saved");
        Ok(model)
    }

    /// Deletes a project. Its team, records, budget lines and projections go
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the project does not exist.
    pub async fn delete_project(&self, project_id: Uuid) -> Result<(), ProjectError> {
        let result = projects::Entity::delete_by_id(project_id)
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ProjectError::NotFound(project_id));
        }

        tracing::info!(%project_id, "Project deleted");
        Ok(())
    }

    /// Checks whether a code is used by another project, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn code_exists(&self, code: &str, exclude: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = projects::Entity::find().filter(
            Expr::expr(Func::upper(Expr::col(projects::Column::Code)))
                .eq(ProjectService::normalize_code(code)),
        );
        if let Some(id) = exclude {
            query = query.filter(projects::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}

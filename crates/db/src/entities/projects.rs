//! `SeaORM` Entity for projects table.

use obra_core::project::Project;
use obra_shared::types::{ProjectId, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ContractType, ProjectStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub client_name: String,
    pub client_company: String,
    pub location: String,
    pub start_date: Date,
    pub end_date: Date,
    pub actual_start_date: Option<Date>,
    pub actual_end_date: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub contract_amount: Decimal,
    pub contract_type: ContractType,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub budget: Decimal,
    pub status: ProjectStatus,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub progress: Decimal,
    pub project_manager: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The fields the domain rules need.
    #[must_use]
    pub fn to_domain(&self) -> Project {
        Project {
            id: ProjectId::from_uuid(self.id),
            code: self.code.clone(),
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            actual_start_date: self.actual_start_date,
            actual_end_date: self.actual_end_date,
            contract_amount: self.contract_amount,
            budget: self.budget,
            status: self.status.into(),
            progress: self.progress,
            created_by: UserId::from_uuid(self.created_by),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::project_team::Entity")]
    ProjectTeam,
    #[sea_orm(has_many = "super::incomes::Entity")]
    Incomes,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(has_many = "super::budget_lines::Entity")]
    BudgetLines,
    #[sea_orm(has_many = "super::cash_flow_projections::Entity")]
    CashFlowProjections,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::project_team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectTeam.def()
    }
}

impl Related<super::incomes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incomes.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::budget_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLines.def()
    }
}

impl Related<super::cash_flow_projections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashFlowProjections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for budget_lines table.

use obra_core::budget::BudgetLine;
use obra_shared::types::BudgetLineId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BudgetCategory;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub category: BudgetCategory,
    pub subcategory: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub planned_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub committed_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub spent_amount: Decimal,
    pub period_start: Date,
    pub period_end: Date,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Converts to the domain type for derived figures.
    #[must_use]
    pub fn to_domain(&self) -> BudgetLine {
        BudgetLine {
            id: BudgetLineId::from_uuid(self.id),
            category: self.category.into(),
            subcategory: self.subcategory.clone(),
            description: self.description.clone(),
            planned_amount: self.planned_amount,
            committed_amount: self.committed_amount,
            spent_amount: self.spent_amount,
            period_start: self.period_start,
            period_end: self.period_end,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id",
        on_delete = "Cascade"
    )]
    Projects,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

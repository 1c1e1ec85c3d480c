//! `SeaORM` Entity for cash_flow_projections table.

use obra_core::cashflow::{CashFlowPeriod, CashFlowProjection};
use obra_shared::types::CashFlowProjectionId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_flow_projections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub year: i32,
    pub month: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub projected_income: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub projected_expense: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub actual_income: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub actual_expense: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub opening_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub closing_balance: Decimal,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Converts to the domain type for derived figures.
    #[must_use]
    pub fn to_domain(&self) -> CashFlowProjection {
        CashFlowProjection {
            id: CashFlowProjectionId::from_uuid(self.id),
            period: CashFlowPeriod {
                year: self.year,
                // Guarded by chk_cash_flow_month.
                month: u32::try_from(self.month).unwrap_or_default(),
            },
            projected_income: self.projected_income,
            projected_expense: self.projected_expense,
            actual_income: self.actual_income,
            actual_expense: self.actual_expense,
            opening_balance: self.opening_balance,
            closing_balance: self.closing_balance,
            notes: self.notes.clone(),
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
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

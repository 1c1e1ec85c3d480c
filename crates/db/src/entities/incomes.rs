//! `SeaORM` Entity for incomes table.

use obra_core::finance::{FinancialRecord, RecordKind};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{IncomeType, PaymentMethod, SettlementState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "incomes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub concept: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub income_type: IncomeType,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub accumulated_amount: Decimal,
    pub due_date: Date,
    pub settlement_date: Option<Date>,
    pub state: SettlementState,
    pub payment_method: Option<PaymentMethod>,
    pub reference_number: String,
    pub bank_account: String,
    pub tied_to_progress: bool,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub progress_percent: Option<Decimal>,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub created_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The reconciliation-relevant slice of the row.
    #[must_use]
    pub fn to_record(&self) -> FinancialRecord {
        FinancialRecord {
            kind: RecordKind::Income,
            total_amount: self.total_amount,
            accumulated_amount: self.accumulated_amount,
            due_date: Some(self.due_date),
            settlement_date: self.settlement_date,
            state: self.state.into(),
            payment_method: self.payment_method.map(Into::into),
            linked_budget_line: None,
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

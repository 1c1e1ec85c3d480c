//! `SeaORM` Entity for expenses table.

use obra_core::finance::{FinancialRecord, RecordKind};
use obra_shared::types::BudgetLineId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ExpenseType, PaymentMethod, SettlementState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub budget_line_id: Option<Uuid>,
    pub concept: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub expense_type: ExpenseType,
    pub supplier: String,
    pub supplier_tax_id: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub accumulated_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub rolled_up_amount: Decimal,
    pub issue_date: Option<Date>,
    pub due_date: Date,
    pub settlement_date: Option<Date>,
    pub state: SettlementState,
    pub payment_method: Option<PaymentMethod>,
    pub invoice_number: String,
    pub purchase_order_number: String,
    pub bank_account: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub vat_withholding: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub income_tax_withholding: Decimal,
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
            kind: RecordKind::Expense,
            total_amount: self.total_amount,
            accumulated_amount: self.accumulated_amount,
            due_date: Some(self.due_date),
            settlement_date: self.settlement_date,
            state: self.state.into(),
            payment_method: self.payment_method.map(Into::into),
            linked_budget_line: self.budget_line_id.map(BudgetLineId::from_uuid),
        }
    }

    /// Paid amount not yet charged to the budget line. Never negative.
    #[must_use]
    pub fn unrolled_amount(&self) -> Decimal {
        (self.accumulated_amount - self.rolled_up_amount).max(Decimal::ZERO)
    }

    /// Total minus both withholdings.
    #[must_use]
    pub fn net_payable(&self) -> Decimal {
        self.total_amount - self.vat_withholding - self.income_tax_withholding
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
    #[sea_orm(
        belongs_to = "super::budget_lines::Entity",
        from = "Column::BudgetLineId",
        to = "super::budget_lines::Column::Id",
        on_delete = "SetNull"
    )]
    BudgetLines,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::budget_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Financial record domain types.

use chrono::NaiveDate;
use obra_shared::types::BudgetLineId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Generates a fieldless enum with a stable snake_case wire name.
///
/// The wire name is what the API accepts and what the database stores.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the wire name of the variant.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Parses a wire name (case-insensitive).
            pub fn parse(s: &str) -> Option<Self> {
                let s = s.trim().to_lowercase();
                Self::ALL.iter().copied().find(|v| v.as_str() == s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Lifecycle state of an income or expense record.
    pub enum SettlementState {
        /// Nothing received/paid yet.
        Pending => "pending",
        /// Some money received/paid, balance outstanding.
        Partial => "partial",
        /// Fully received/paid.
        Settled => "settled",
        /// Voided; no longer expected.
        Cancelled => "cancelled",
    }
}

impl SettlementState {
    /// Returns true while money is still expected to move.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }

    /// Derives the state implied by the accumulated amount.
    ///
    /// `Settled` once the total is covered, `Partial` when something has
    /// been settled, otherwise `current` is kept.
    #[must_use]
    pub fn derive(current: Self, accumulated: Decimal, total: Decimal) -> Self {
        if accumulated >= total {
            Self::Settled
        } else if accumulated > Decimal::ZERO {
            Self::Partial
        } else {
            current
        }
    }
}

wire_enum! {
    /// Payment channel used to settle a record.
    pub enum PaymentMethod {
        /// Bank transfer.
        Transfer => "transfer",
        /// Cheque.
        Check => "check",
        /// Cash.
        Cash => "cash",
        /// Credit card.
        Card => "card",
        /// Anything else.
        Other => "other",
    }
}

wire_enum! {
    /// Income classification.
    pub enum IncomeType {
        /// Contract advance.
        Advance => "advance",
        /// Payment against certified progress.
        ProgressPayment => "progress_payment",
        /// Final settlement of the contract.
        FinalPayment => "final_payment",
        /// Extra income outside the contract.
        Additional => "additional",
        /// Contract value adjustment.
        ContractAdjustment => "contract_adjustment",
        /// Anything else.
        Other => "other",
    }
}

wire_enum! {
    /// Expense classification.
    pub enum ExpenseType {
        /// Construction materials.
        Material => "material",
        /// Labor.
        Labor => "labor",
        /// Subcontracted work.
        Subcontract => "subcontract",
        /// Equipment and machinery.
        Equipment => "equipment",
        /// Administrative overhead.
        Administrative => "administrative",
        /// Services.
        Service => "service",
        /// Transport.
        Transport => "transport",
        /// Taxes.
        Tax => "tax",
        /// Anything else.
        Other => "other",
    }
}

/// Which side of the books a record sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Money owed to the project (received).
    Income,
    /// Money owed by the project (paid).
    Expense,
}

/// The reconciliation-relevant slice of an income or expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRecord {
    /// Income or expense.
    pub kind: RecordKind,
    /// Contractual/invoiced amount.
    pub total_amount: Decimal,
    /// Received (income) or paid (expense) to date.
    pub accumulated_amount: Decimal,
    /// When the money is expected or owed.
    pub due_date: Option<NaiveDate>,
    /// Date of the latest settlement.
    pub settlement_date: Option<NaiveDate>,
    /// Lifecycle state.
    pub state: SettlementState,
    /// Channel of the latest settlement.
    pub payment_method: Option<PaymentMethod>,
    /// Budget line charged by an expense.
    pub linked_budget_line: Option<BudgetLineId>,
}

impl FinancialRecord {
    /// Creates a fresh pending income.
    #[must_use]
    pub fn new_income(total_amount: Decimal, due_date: Option<NaiveDate>) -> Self {
        Self {
            kind: RecordKind::Income,
            total_amount,
            accumulated_amount: Decimal::ZERO,
            due_date,
            settlement_date: None,
            state: SettlementState::Pending,
            payment_method: None,
            linked_budget_line: None,
        }
    }

    /// Creates a fresh pending expense, optionally charged to a budget line.
    #[must_use]
    pub fn new_expense(
        total_amount: Decimal,
        due_date: Option<NaiveDate>,
        linked_budget_line: Option<BudgetLineId>,
    ) -> Self {
        Self {
            kind: RecordKind::Expense,
            linked_budget_line,
            ..Self::new_income(total_amount, due_date)
        }
    }

    /// Amount still outstanding.
    #[must_use]
    pub fn pending_amount(&self) -> Decimal {
        self.total_amount - self.accumulated_amount
    }

    /// Returns true once the total has been covered.
    #[must_use]
    pub fn is_fully_settled(&self) -> bool {
        self.accumulated_amount >= self.total_amount
    }
}

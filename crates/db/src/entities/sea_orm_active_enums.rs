//! `SeaORM` active enums mapped to the Postgres enum types.
//!
//! Each enum converts losslessly to and from its `obra_core` counterpart.

use obra_core::{budget, finance, project};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

macro_rules! db_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($pg:literal) <=> $core:path {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
        #[sea_orm(rs_type = "String", db_type = "Enum", enum_name = $pg)]
        pub enum $name {
            $(
                #[sea_orm(string_value = $wire)]
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl From<$core> for $name {
            fn from(value: $core) -> Self {
                type Core = $core;
                match value {
                    $(Core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$name> for $core {
            fn from(value: $name) -> Self {
                type Core = $core;
                match value {
                    $($name::$variant => Core::$variant,)+
                }
            }
        }
    };
}

db_enum! {
    /// Lifecycle state of an income or expense.
    SettlementState("settlement_state") <=> finance::SettlementState {
        Pending => "pending",
        Partial => "partial",
        Settled => "settled",
        Cancelled => "cancelled",
    }
}

db_enum! {
    /// Payment channel.
    PaymentMethod("payment_method") <=> finance::PaymentMethod {
        Transfer => "transfer",
        Check => "check",
        Cash => "cash",
        Card => "card",
        Other => "other",
    }
}

db_enum! {
    /// Income classification.
    IncomeType("income_type") <=> finance::IncomeType {
        Advance => "advance",
        ProgressPayment => "progress_payment",
        FinalPayment => "final_payment",
        Additional => "additional",
        ContractAdjustment => "contract_adjustment",
        Other => "other",
    }
}

db_enum! {
    /// Expense classification.
    ExpenseType("expense_type") <=> finance::ExpenseType {
        Material => "material",
        Labor => "labor",
        Subcontract => "subcontract",
        Equipment => "equipment",
        Administrative => "administrative",
        Service => "service",
        Transport => "transport",
        Tax => "tax",
        Other => "other",
    }
}

db_enum! {
    /// Budget line category.
    BudgetCategory("budget_category") <=> budget::BudgetCategory {
        Materials => "materials",
        Labor => "labor",
        Equipment => "equipment",
        Subcontracts => "subcontracts",
        Administrative => "administrative",
        Indirect => "indirect",
        Contingency => "contingency",
        Other => "other",
    }
}

db_enum! {
    /// Project status.
    ProjectStatus("project_status") <=> project::ProjectStatus {
        Planning => "planning",
        Active => "active",
        OnHold => "on_hold",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

db_enum! {
    /// Contract pricing model.
    ContractType("contract_type") <=> project::ContractType {
        FixedPrice => "fixed_price",
        TimeMaterial => "time_material",
        CostPlus => "cost_plus",
    }
}

db_enum! {
    /// Team role.
    TeamRole("team_role") <=> project::TeamRole {
        Manager => "manager",
        Supervisor => "supervisor",
        Engineer => "engineer",
        Foreman => "foreman",
        Accountant => "accountant",
        Assistant => "assistant",
    }
}

//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Settlements run in their own transaction with the record row locked.

pub mod budget_line;
pub mod cash_flow;
pub mod expense;
pub mod income;
pub mod project;
pub mod user;

pub use budget_line::{BudgetLineError, BudgetLineRepository, BudgetOverview};
pub use cash_flow::{CashFlowOverview, CashFlowRepoError, CashFlowRepository};
pub use expense::{
    ExpenseError, ExpenseFilter, ExpenseInput, ExpenseRepository, ExpenseSettlement,
};
pub use income::{IncomeError, IncomeFilter, IncomeInput, IncomeRepository, IncomeSettlement};
pub use project::{ProjectError, ProjectRepository};
pub use user::UserRepository;

//! Budget lines and their consumption.
//!
//! A budget line plans an amount for one cost category of a project. Expense
//! settlements charge its spent amount (see `finance::rollup`).

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use service::BudgetService;
pub use types::{
    BudgetCategory, BudgetLine, BudgetLineInput, BudgetSummary, VarianceResult, VarianceStatus,
};

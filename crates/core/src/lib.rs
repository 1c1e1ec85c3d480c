//! Core business logic for Obra.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `finance` - Income/expense reconciliation: state checks, settlements,
//!   overdue classification and budget rollup
//! - `budget` - Budget lines and consumption figures
//! - `cashflow` - Monthly cash-flow projections
//! - `project` - Projects, team roles and project-scoped access
//! - `money` - Storage limits shared by every amount

pub mod budget;
pub mod cashflow;
pub mod finance;
pub mod money;
pub mod project;

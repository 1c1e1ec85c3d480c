//! `SeaORM` entity definitions.

pub mod budget_lines;
pub mod cash_flow_projections;
pub mod expenses;
pub mod incomes;
pub mod project_team;
pub mod projects;
pub mod sea_orm_active_enums;
pub mod users;

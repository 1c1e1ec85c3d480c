//! Project data types.

use chrono::NaiveDate;
use obra_shared::types::{ProjectId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::finance::types::wire_enum;

wire_enum! {
    /// Project lifecycle status.
    pub enum ProjectStatus {
        /// Being planned.
        Planning => "planning",
        /// Under construction.
        Active => "active",
        /// Paused.
        OnHold => "on_hold",
        /// Finished.
        Completed => "completed",
        /// Abandoned.
        Cancelled => "cancelled",
    }
}

impl ProjectStatus {
    /// Returns true once the project can no longer progress.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

wire_enum! {
    /// Contract pricing model.
    pub enum ContractType {
        /// Fixed price.
        FixedPrice => "fixed_price",
        /// Time and materials.
        TimeMaterial => "time_material",
        /// Cost plus fee.
        CostPlus => "cost_plus",
    }
}

wire_enum! {
    /// Role of a team member in a project.
    pub enum TeamRole {
        /// Project manager.
        Manager => "manager",
        /// Site supervisor.
        Supervisor => "supervisor",
        /// Engineer.
        Engineer => "engineer",
        /// Foreman.
        Foreman => "foreman",
        /// Accountant.
        Accountant => "accountant",
        /// Assistant.
        Assistant => "assistant",
    }
}

/// A construction project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID.
    pub id: ProjectId,
    /// Unique code.
    pub code: String,
    /// Name.
    pub name: String,
    /// Planned start.
    pub start_date: NaiveDate,
    /// Planned end.
    pub end_date: NaiveDate,
    /// Actual start.
    pub actual_start_date: Option<NaiveDate>,
    /// Actual end.
    pub actual_end_date: Option<NaiveDate>,
    /// Contract value.
    pub contract_amount: Decimal,
    /// Allocated budget.
    pub budget: Decimal,
    /// Status.
    pub status: ProjectStatus,
    /// Progress percentage.
    pub progress: Decimal,
    /// Creator.
    pub created_by: UserId,
}

impl Project {
    /// Returns true while under construction.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    /// Duration in days, from actual dates when both are known.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        match (self.actual_start_date, self.actual_end_date) {
            (Some(start), Some(end)) => (end - start).num_days(),
            _ => (self.end_date - self.start_date).num_days(),
        }
    }

    /// Days left until the planned end, never negative.
    #[must_use]
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        if self.status.is_closed() {
            return 0;
        }
        (self.end_date - today).num_days().max(0)
    }
}

/// Input for creating or updating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInput {
    /// Unique code.
    pub code: String,
    /// Name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Client name.
    pub client_name: String,
    /// Client company.
    #[serde(default)]
    pub client_company: String,
    /// Site location.
    pub location: String,
    /// Planned start.
    pub start_date: NaiveDate,
    /// Planned end.
    pub end_date: NaiveDate,
    /// Actual start.
    #[serde(default)]
    pub actual_start_date: Option<NaiveDate>,
    /// Actual end.
    #[serde(default)]
    pub actual_end_date: Option<NaiveDate>,
    /// Contract value.
    pub contract_amount: Decimal,
    /// Contract pricing model.
    #[serde(default = "default_contract_type")]
    pub contract_type: ContractType,
    /// Allocated budget.
    pub budget: Decimal,
    /// Status.
    #[serde(default = "default_status")]
    pub status: ProjectStatus,
    /// Progress percentage.
    #[serde(default)]
    pub progress: Decimal,
    /// Project manager.
    #[serde(default)]
    pub project_manager: Option<UserId>,
}

fn default_contract_type() -> ContractType {
    ContractType::FixedPrice
}

fn default_status() -> ProjectStatus {
    ProjectStatus::Planning
}

/// Input for adding or updating a team member.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberInput {
    /// Member.
    pub user_id: UserId,
    /// Role.
    pub role: TeamRole,
    /// Assignment start.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Assignment end.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Whether the assignment is active.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// May register settlements.
    #[serde(default)]
    pub can_approve_payments: bool,
    /// May manage payroll.
    #[serde(default)]
    pub can_manage_payroll: bool,
    /// May see and edit financial plans.
    #[serde(default)]
    pub can_view_financials: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(status: ProjectStatus) -> Project {
        Project {
            id: ProjectId::new(),
            code: "OB-2025-014".to_string(),
            name: "Bodega industrial Lote 7".to_string(),
            start_date: date(2025, 1, 10),
            end_date: date(2025, 7, 10),
            actual_start_date: None,
            actual_end_date: None,
            contract_amount: dec!(850000),
            budget: dec!(720000),
            status,
            progress: dec!(40),
            created_by: UserId::new(),
        }
    }

    #[test]
    fn test_duration_prefers_actual_dates() {
        let mut p = project(ProjectStatus::Active);
        assert_eq!(p.duration_days(), 181);
        p.actual_start_date = Some(date(2025, 1, 20));
        assert_eq!(p.duration_days(), 181);
        p.actual_end_date = Some(date(2025, 1, 30));
        assert_eq!(p.duration_days(), 10);
    }

    #[test]
    fn test_days_remaining() {
        let p = project(ProjectStatus::Active);
        assert_eq!(p.days_remaining(date(2025, 7, 1)), 9);
        assert_eq!(p.days_remaining(date(2025, 8, 1)), 0);
        assert_eq!(
            project(ProjectStatus::Completed).days_remaining(date(2025, 7, 1)),
            0
        );
    }

    #[test]
    fn test_status_helpers() {
        assert!(project(ProjectStatus::Active).is_active());
        assert!(!project(ProjectStatus::OnHold).is_active());
        assert!(ProjectStatus::Cancelled.is_closed());
        assert_eq!(ProjectStatus::parse("on_hold"), Some(ProjectStatus::OnHold));
        assert_eq!(TeamRole::Foreman.as_str(), "foreman");
    }
}

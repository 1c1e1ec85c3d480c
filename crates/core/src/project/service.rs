//! Project input validation.

use rust_decimal::Decimal;

use super::error::ProjectError;
use super::types::{ProjectInput, TeamMemberInput};
use crate::finance::FieldError;
use crate::money::{amount_limit_message, fits_amount};

/// Project service for business logic.
pub struct ProjectService;

impl ProjectService {
    /// Normalizes a project code for uniqueness comparisons.
    #[must_use]
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Validates a project input, collecting every field error.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Validation`.
    pub fn validate_project(input: &ProjectInput) -> Result<(), ProjectError> {
        let mut errors = Vec::new();

        let code = input.code.trim();
        if code.is_empty() {
            errors.push(FieldError::new("code", "Code is required"));
        } else if code.chars().count() > 50 {
            errors.push(FieldError::new("code", "Code cannot exceed 50 characters"));
        }
        for (field, value, max) in [
            ("name", &input.name, 200),
            ("client_name", &input.client_name, 200),
            ("location", &input.location, 300),
        ] {
            let value = value.trim();
            if value.is_empty() {
                errors.push(FieldError::new(field, "This field is required"));
            } else if value.chars().count() > max {
                errors.push(FieldError::new(
                    field,
                    format!("Cannot exceed {max} characters"),
                ));
            }
        }

        if input.end_date < input.start_date {
            errors.push(FieldError::new(
                "end_date",
                "End date cannot be before the start date",
            ));
        }
        if let (Some(start), Some(end)) = (input.actual_start_date, input.actual_end_date)
            && end < start
        {
            errors.push(FieldError::new(
                "actual_end_date",
                "Actual end date cannot be before the actual start date",
            ));
        }
        if input.contract_amount < Decimal::ZERO {
            errors.push(FieldError::new(
                "contract_amount",
                "Contract amount cannot be negative",
            ));
        } else if !fits_amount(input.contract_amount) {
            errors.push(FieldError::new("contract_amount", amount_limit_message()));
        }
        if input.budget < Decimal::ZERO {
            errors.push(FieldError::new("budget", "Budget cannot be negative"));
        } else if !fits_amount(input.budget) {
            errors.push(FieldError::new("budget", amount_limit_message()));
        }
        if input.progress < Decimal::ZERO || input.progress > Decimal::ONE_HUNDRED {
            errors.push(FieldError::new(
                "progress",
                "Progress must be between 0 and 100",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProjectError::Validation(errors))
        }
    }

    /// Validates a team member input.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Validation` if the assignment ends before it
    /// starts.
    pub fn validate_team_member(input: &TeamMemberInput) -> Result<(), ProjectError> {
        if let (Some(start), Some(end)) = (input.start_date, input.end_date)
            && end < start
        {
            return Err(ProjectError::Validation(vec![FieldError::new(
                "end_date",
                "End date cannot be before the start date",
            )]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::types::{ContractType, ProjectStatus, TeamRole};
    use chrono::NaiveDate;
    use obra_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input() -> ProjectInput {
        ProjectInput {
            code: "ob-2025-014".to_string(),
            name: "Bodega industrial Lote 7".to_string(),
            description: String::new(),
            client_name: "Inmobiliaria Norte".to_string(),
            client_company: String::new(),
            location: "Parque industrial, Lote 7".to_string(),
            start_date: date(2025, 1, 10),
            end_date: date(2025, 7, 10),
            actual_start_date: None,
            actual_end_date: None,
            contract_amount: dec!(850000),
            contract_type: ContractType::FixedPrice,
            budget: dec!(720000),
            status: ProjectStatus::Planning,
            progress: dec!(0),
            project_manager: None,
        }
    }

    fn fields(err: ProjectError) -> Vec<String> {
        match err {
            ProjectError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_project() {
        assert!(ProjectService::validate_project(&input()).is_ok());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(ProjectService::normalize_code(" ob-2025-014 "), "OB-2025-014");
    }

    #[test]
    fn test_end_before_start() {
        let mut i = input();
        i.end_date = date(2024, 12, 31);
        assert_eq!(
            fields(ProjectService::validate_project(&i).unwrap_err()),
            vec!["end_date"]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut i = input();
        i.code = String::new();
        i.location = " ".to_string();
        i.budget = dec!(-1);
        i.progress = dec!(101);
        assert_eq!(
            fields(ProjectService::validate_project(&i).unwrap_err()),
            vec!["code", "location", "budget", "progress"]
        );
    }

    #[test]
    fn test_amounts_must_fit_in_cents() {
        let mut i = input();
        i.contract_amount = dec!(850000.001);
        i.budget = dec!(12345678901234);
        assert_eq!(
            fields(ProjectService::validate_project(&i).unwrap_err()),
            vec!["contract_amount", "budget"]
        );
    }

    #[test]
    fn test_team_member_dates() {
        let mut m = TeamMemberInput {
            user_id: UserId::new(),
            role: TeamRole::Engineer,
            start_date: Some(date(2025, 2, 1)),
            end_date: Some(date(2025, 1, 1)),
            is_active: true,
            can_approve_payments: false,
            can_manage_payroll: false,
            can_view_financials: false,
        };
        assert!(ProjectService::validate_team_member(&m).is_err());
        m.end_date = None;
        assert!(ProjectService::validate_team_member(&m).is_ok());
    }
}

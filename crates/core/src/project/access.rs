//! Project-scoped access checks.
//!
//! Access is decided per project from the caller's team assignment. Staff
//! users bypass membership.

use serde::Serialize;

use super::error::ProjectError;
use super::types::TeamRole;

/// Something a user may want to do in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPermission {
    /// Read the project and its records; create and edit records.
    View,
    /// Register receipts/payments and settle records.
    ApprovePayments,
    /// Edit budget lines and cash-flow projections.
    ManageFinancials,
    /// Edit the project itself.
    Edit,
    /// Add or change team members.
    ManageTeam,
    /// Delete the project.
    Delete,
}

impl ProjectPermission {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::ApprovePayments => "approve_payments",
            Self::ManageFinancials => "manage_financials",
            Self::Edit => "edit",
            Self::ManageTeam => "manage_team",
            Self::Delete => "delete",
        }
    }
}

/// The caller's standing in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Membership {
    /// Active team role, if any.
    pub role: Option<TeamRole>,
    /// Assignment flag.
    pub can_approve_payments: bool,
    /// Assignment flag.
    pub can_view_financials: bool,
    /// Whether the caller created the project.
    pub is_creator: bool,
    /// Whether the caller is platform staff.
    pub is_staff: bool,
}

impl Membership {
    /// Returns true when the caller has an active assignment.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.role.is_some()
    }

    fn is_manager(&self) -> bool {
        self.role == Some(TeamRole::Manager)
    }

    /// Checks whether the caller may perform `permission`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::NotMember` when the caller cannot see the
    /// project at all, `ProjectError::Forbidden` otherwise.
    pub fn authorize(&self, permission: ProjectPermission) -> Result<(), ProjectError> {
        if self.is_staff {
            return Ok(());
        }
        if !self.is_member() && !self.is_creator {
            return Err(ProjectError::NotMember);
        }

        let allowed = match permission {
            ProjectPermission::View => true,
            ProjectPermission::ApprovePayments => {
                self.is_member() && (self.can_approve_payments || self.is_manager())
            }
            ProjectPermission::ManageFinancials => {
                self.is_member() && (self.can_view_financials || self.is_manager())
            }
            ProjectPermission::Edit | ProjectPermission::ManageTeam => {
                self.is_manager() || self.is_creator
            }
            ProjectPermission::Delete => self.is_creator,
        };

        if allowed {
            Ok(())
        } else {
            Err(ProjectError::Forbidden(permission))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(role: TeamRole) -> Membership {
        Membership {
            role: Some(role),
            ..Membership::default()
        }
    }

    #[test]
    fn test_outsider_cannot_view() {
        assert_eq!(
            Membership::default().authorize(ProjectPermission::View),
            Err(ProjectError::NotMember)
        );
    }

    #[test]
    fn test_member_can_view_but_not_settle() {
        let m = member(TeamRole::Engineer);
        assert!(m.authorize(ProjectPermission::View).is_ok());
        assert_eq!(
            m.authorize(ProjectPermission::ApprovePayments),
            Err(ProjectError::Forbidden(ProjectPermission::ApprovePayments))
        );
    }

    #[test]
    fn test_payment_flag_allows_settlement() {
        let m = Membership {
            can_approve_payments: true,
            ..member(TeamRole::Accountant)
        };
        assert!(m.authorize(ProjectPermission::ApprovePayments).is_ok());
        assert!(m.authorize(ProjectPermission::ManageFinancials).is_err());
    }

    #[test]
    fn test_manager_has_financial_permissions() {
        let m = member(TeamRole::Manager);
        assert!(m.authorize(ProjectPermission::ApprovePayments).is_ok());
        assert!(m.authorize(ProjectPermission::ManageFinancials).is_ok());
        assert!(m.authorize(ProjectPermission::ManageTeam).is_ok());
        assert!(m.authorize(ProjectPermission::Edit).is_ok());
        assert!(m.authorize(ProjectPermission::Delete).is_err());
    }

    #[test]
    fn test_only_creator_deletes() {
        let creator = Membership {
            is_creator: true,
            ..Membership::default()
        };
        assert!(creator.authorize(ProjectPermission::Delete).is_ok());
        assert!(creator.authorize(ProjectPermission::ManageTeam).is_ok());
        assert!(creator.authorize(ProjectPermission::ApprovePayments).is_err());
    }

    #[test]
    fn test_staff_bypasses_membership() {
        let staff = Membership {
            is_staff: true,
            ..Membership::default()
        };
        assert!(staff.authorize(ProjectPermission::Delete).is_ok());
    }
}

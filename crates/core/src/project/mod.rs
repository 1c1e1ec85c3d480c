//! Construction projects, their team and project-scoped access.

pub mod access;
pub mod error;
pub mod service;
pub mod types;

pub use access::{Membership, ProjectPermission};
pub use error::ProjectError;
pub use service::ProjectService;
pub use types::{ContractType, Project, ProjectInput, ProjectStatus, TeamMemberInput, TeamRole};

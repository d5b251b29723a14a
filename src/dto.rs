//! Data transfer objects - typed inputs handed to the service layer.
//!
//! Every service mutation takes one of these instead of a long argument list.
//! They derive `Deserialize` so a transport layer can build them straight from
//! a request body; the services still perform every business check themselves.

use crate::{
    core::reference::EntityRef,
    entities::{AuthorizationKind, RelationshipType, UserType},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// New user account
#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Account type
    pub user_type: UserType,
}

/// Partial user update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserDto {
    /// New display name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New account type (admins only)
    pub user_type: Option<UserType>,
}

/// New company
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyDto {
    /// Company name
    pub name: String,
    /// Description
    pub about: Option<String>,
}

/// Partial company update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompanyDto {
    /// New name
    pub name: Option<String>,
    /// New description
    pub about: Option<String>,
}

/// New project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDto {
    /// Project name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Company to run the project under
    pub company_id: Option<i64>,
    /// First day of the project
    pub start_date: Option<NaiveDate>,
    /// Last day of the project
    pub end_date: Option<NaiveDate>,
}

/// Partial project update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectDto {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New first day
    pub start_date: Option<NaiveDate>,
    /// New last day
    pub end_date: Option<NaiveDate>,
}

/// Session to schedule or reschedule
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDto {
    /// Short title
    pub name: String,
    /// Start instant
    pub start_at: DateTime<Utc>,
    /// End instant
    pub end_at: DateTime<Utc>,
    /// Facilitator running the session; defaults to the acting user
    pub facilitator_id: Option<i64>,
}

/// Name and description shared by skills, jobs and the role/permission catalog
#[derive(Debug, Clone, Deserialize)]
pub struct NamedDto {
    /// Name
    pub name: String,
    /// Description
    pub description: Option<String>,
}

/// New job posting
#[derive(Debug, Clone, Deserialize)]
pub struct JobDto {
    /// Job title
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Company offering the job
    pub company_id: Option<i64>,
}

/// New or updated level
#[derive(Debug, Clone, Deserialize)]
pub struct LevelDto {
    /// Level name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Position in the ladder
    pub value: i32,
}

/// Invitation or application
#[derive(Debug, Clone, Deserialize)]
pub struct RequestDto {
    /// Sending entity
    pub from: EntityRef,
    /// Receiving entity
    pub to: EntityRef,
    /// Entity the requested relationship is about
    pub regarding: EntityRef,
    /// Relationship requested
    pub request_type: RelationshipType,
}

/// Grant of a role or permission
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationDto {
    /// Company or project the grant is scoped to
    pub authorizable: EntityRef,
    /// Role or permission
    pub authorization_type: AuthorizationKind,
    /// Id of the role or permission
    pub authorization_id: i64,
    /// User receiving the grant
    pub authorized_id: i64,
}

/// Trims a required name, rejecting blank input.
pub(crate) fn required_name(value: &str, what: &str) -> crate::errors::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::errors::Error::validation(format!(
            "{what} name cannot be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional description, mapping blank input to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_required_name_trims() {
        assert_eq!(required_name("  Acme ", "Company").unwrap(), "Acme");
        assert!(required_name("   ", "Company").is_err());
    }

    #[test]
    fn test_optional_text_drops_blank() {
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(
            optional_text(Some(" hi ".to_string())),
            Some("hi".to_string())
        );
    }
}

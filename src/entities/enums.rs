//! Enumerated column types shared by several entities.
//!
//! All enums are stored as short lowercase strings so the database stays
//! readable and new variants do not require renumbering.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account type of a user; drives the coarse-grained part of every policy decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Platform owner, cannot be removed by anyone else
    #[sea_orm(string_value = "superadmin")]
    SuperAdmin,
    /// Platform administrator
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Mentor running projects and sessions
    #[sea_orm(string_value = "facilitator")]
    Facilitator,
    /// Student taking part in projects
    #[sea_orm(string_value = "learner")]
    Learner,
    /// Guardian of one or more learners
    #[sea_orm(string_value = "parent")]
    Parent,
}

impl UserType {
    /// Admins and super admins.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

/// Kind half of a polymorphic `(type, id)` column pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Points at `users`
    #[sea_orm(string_value = "user")]
    User,
    /// Points at `companies`
    #[sea_orm(string_value = "company")]
    Company,
    /// Points at `projects`
    #[sea_orm(string_value = "project")]
    Project,
}

/// Typed link stored in the `relations` table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// User → company
    #[sea_orm(string_value = "company_member")]
    CompanyMember,
    /// User → company, may manage members and respond for the company
    #[sea_orm(string_value = "company_administrator")]
    CompanyAdministrator,
    /// Parent user → ward user
    #[sea_orm(string_value = "parent")]
    Parent,
    /// Ward user → parent user
    #[sea_orm(string_value = "ward")]
    Ward,
    /// User → project, runs the project
    #[sea_orm(string_value = "project_facilitator")]
    ProjectFacilitator,
    /// User → project, takes part in the project
    #[sea_orm(string_value = "project_learner")]
    ProjectLearner,
}

/// Group of relationship types that are mutually exclusive for one `(by, to)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationContext {
    /// Member / administrator
    Company,
    /// Facilitator / learner
    Project,
    /// Parent / ward
    Family,
}

impl RelationshipType {
    /// Context this relationship belongs to.
    #[must_use]
    pub const fn context(self) -> RelationContext {
        match self {
            Self::CompanyMember | Self::CompanyAdministrator => RelationContext::Company,
            Self::ProjectFacilitator | Self::ProjectLearner => RelationContext::Project,
            Self::Parent | Self::Ward => RelationContext::Family,
        }
    }

    /// Every relationship type in the same context, including `self`.
    #[must_use]
    pub const fn siblings(self) -> &'static [Self] {
        match self.context() {
            RelationContext::Company => &[Self::CompanyMember, Self::CompanyAdministrator],
            RelationContext::Project => &[Self::ProjectFacilitator, Self::ProjectLearner],
            RelationContext::Family => &[Self::Parent, Self::Ward],
        }
    }

    /// Kind of entity the `to` side must be.
    #[must_use]
    pub const fn target_kind(self) -> EntityKind {
        match self.context() {
            RelationContext::Company => EntityKind::Company,
            RelationContext::Project => EntityKind::Project,
            RelationContext::Family => EntityKind::User,
        }
    }

    /// The type stored on the reverse edge, for relationships recorded in both directions.
    #[must_use]
    pub const fn reverse(self) -> Option<Self> {
        match self {
            Self::Parent => Some(Self::Ward),
            Self::Ward => Some(Self::Parent),
            _ => None,
        }
    }
}

/// Lifecycle state of a request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Waiting for an answer
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted; the relation exists
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Declined
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// Answer recorded in a response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Request accepted
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Request declined
    #[sea_orm(string_value = "declined")]
    Declined,
}

impl From<ResponseType> for RequestState {
    fn from(value: ResponseType) -> Self {
        match value {
            ResponseType::Accepted => Self::Accepted,
            ResponseType::Declined => Self::Declined,
        }
    }
}

/// What an authorization grants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationKind {
    /// Row in `roles`
    #[sea_orm(string_value = "role")]
    Role,
    /// Row in `permissions`
    #[sea_orm(string_value = "permission")]
    Permission,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_contexts() {
        assert_eq!(
            RelationshipType::CompanyAdministrator.context(),
            RelationContext::Company
        );
        assert_eq!(
            RelationshipType::ProjectLearner.target_kind(),
            EntityKind::Project
        );
        assert!(
            RelationshipType::CompanyMember
                .siblings()
                .contains(&RelationshipType::CompanyAdministrator)
        );
        assert!(
            !RelationshipType::CompanyMember
                .siblings()
                .contains(&RelationshipType::ProjectLearner)
        );
    }

    #[test]
    fn test_family_relationships_reverse() {
        assert_eq!(
            RelationshipType::Parent.reverse(),
            Some(RelationshipType::Ward)
        );
        assert_eq!(RelationshipType::CompanyMember.reverse(), None);
    }

    #[test]
    fn test_response_maps_to_state() {
        assert_eq!(
            RequestState::from(ResponseType::Declined),
            RequestState::Declined
        );
    }
}

//! Authorization entity - "user X grants role/permission Y, scoped to entity Z, to user W".

use super::enums::{AuthorizationKind, EntityKind};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Authorization database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authorizations")]
pub struct Model {
    /// Unique identifier for the authorization
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Grantor
    pub user_id: i64,
    /// Kind of the scoping entity (company or project)
    pub authorizable_type: EntityKind,
    /// Id of the scoping entity
    pub authorizable_id: i64,
    /// Whether a role or a permission is granted
    pub authorization_type: AuthorizationKind,
    /// Id of the granted role or permission
    pub authorization_id: i64,
    /// User receiving the grant
    pub authorized_id: i64,
    /// When the authorization was created
    pub created_at: DateTimeUtc,
    /// When the authorization was last modified
    pub updated_at: DateTimeUtc,
}

/// Authorizable and authorization ends are polymorphic
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

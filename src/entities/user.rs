//! User entity - Every person on the platform.
//!
//! The `user_type` column decides what a user may create; relations decide
//! what they may touch. Users are soft-deleted so their history survives.

use super::enums::UserType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, stored lowercased
    #[sea_orm(unique)]
    pub email: String,
    /// Account type
    pub user_type: UserType,
    /// Soft delete flag - if true, the account is hidden but data is preserved
    pub is_deleted: bool,
    /// When the user was created
    pub created_at: DateTimeUtc,
    /// When the user was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many companies
    #[sea_orm(has_many = "super::company::Entity")]
    Companies,
    /// One user owns many projects
    #[sea_orm(has_many = "super::project::Entity")]
    Projects,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

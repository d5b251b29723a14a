//! Company entity - An organisation that groups members and sponsors projects.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Company database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    /// Unique identifier for the company
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Company name, unique among active companies
    pub name: String,
    /// Free-form description
    pub about: Option<String>,
    /// Owner of the company
    pub user_id: i64,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the company was created
    pub created_at: DateTimeUtc,
    /// When the company was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Company and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each company is owned by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
    /// One company sponsors many projects
    #[sea_orm(has_many = "super::project::Entity")]
    Projects,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

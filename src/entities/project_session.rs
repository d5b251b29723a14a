//! Project session entity - A scheduled meeting inside a project.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_sessions")]
pub struct Model {
    /// Unique identifier for the session
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Project the session belongs to
    pub project_id: i64,
    /// Facilitator running the session
    pub user_id: i64,
    /// Short title
    pub name: String,
    /// When the session starts
    pub start_at: DateTimeUtc,
    /// When the session ends
    pub end_at: DateTimeUtc,
    /// When the session was created
    pub created_at: DateTimeUtc,
    /// When the session was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `ProjectSession` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session belongs to one project
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

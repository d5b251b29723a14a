//! Role entity - Catalog entry that authorizations can grant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique name (e.g., `"mentor"`, `"edit_projects"`)
    #[sea_orm(unique)]
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Admin who created the entry
    pub user_id: i64,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// When the entry was last modified
    pub updated_at: DateTimeUtc,
}

/// Authorizations reference this table polymorphically, so there is no ORM relation
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Skill entity - Something a learner can acquire.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Skill database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "skills")]
pub struct Model {
    /// Unique identifier for the skill
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Skill name (e.g., "Rust", "Public speaking")
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// User who added the skill
    pub user_id: i64,
    /// When the skill was created
    pub created_at: DateTimeUtc,
    /// When the skill was last modified
    pub updated_at: DateTimeUtc,
}

/// Skills have no ORM-level relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

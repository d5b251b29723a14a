//! Level entity - A rung in a creator's progression ladder.
//!
//! `value` orders levels; it is unique within one creator's collection.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Level database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "levels")]
pub struct Model {
    /// Unique identifier for the level
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Level name (e.g., "Beginner")
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Position in the ladder, lowest first
    pub value: i32,
    /// User who defined the level
    pub user_id: i64,
    /// When the level was created
    pub created_at: DateTimeUtc,
    /// When the level was last modified
    pub updated_at: DateTimeUtc,
}

/// Levels have no ORM-level relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

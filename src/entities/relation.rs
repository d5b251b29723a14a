//! Relation entity - A directed, typed link between two polymorphic entities.
//!
//! Both ends are stored as `(kind, id)` pairs; use
//! [`crate::core::reference::EntityRef`] to work with them as one value.

use super::enums::{EntityKind, RelationshipType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Relation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "relations")]
pub struct Model {
    /// Unique identifier for the relation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Kind of the entity holding the relationship
    pub by_type: EntityKind,
    /// Id of the entity holding the relationship
    pub by_id: i64,
    /// Kind of the entity the relationship points at
    pub to_type: EntityKind,
    /// Id of the entity the relationship points at
    pub to_id: i64,
    /// What the relationship means
    pub relationship_type: RelationshipType,
    /// When the relation was created
    pub created_at: DateTimeUtc,
    /// When the relation was last modified
    pub updated_at: DateTimeUtc,
}

/// Both ends are polymorphic, so there are no ORM relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

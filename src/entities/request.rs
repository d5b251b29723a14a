//! Request entity - An invitation from one entity to another, regarding a third.
//!
//! `request_type` is the relationship the sender wants created once the
//! request is accepted. The state moves out of `pending` exactly once.

use super::enums::{EntityKind, RelationshipType, RequestState};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who created the request
    pub user_id: i64,
    /// Kind of the sending entity
    pub from_type: EntityKind,
    /// Id of the sending entity
    pub from_id: i64,
    /// Kind of the receiving entity
    pub to_type: EntityKind,
    /// Id of the receiving entity
    pub to_id: i64,
    /// Kind of the entity the request is about
    pub for_type: EntityKind,
    /// Id of the entity the request is about
    pub for_id: i64,
    /// Relationship requested
    pub request_type: RelationshipType,
    /// Current state
    pub state: RequestState,
    /// When the request was created
    pub created_at: DateTimeUtc,
    /// When the request was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Request and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A request receives at most one response
    #[sea_orm(has_one = "super::response::Entity")]
    Response,
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

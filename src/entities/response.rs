//! Response entity - The single answer given to a request.

use super::enums::ResponseType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Response database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "responses")]
pub struct Model {
    /// Unique identifier for the response
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Request being answered
    #[sea_orm(unique)]
    pub request_id: i64,
    /// User who answered
    pub user_id: i64,
    /// The answer
    pub response_type: ResponseType,
    /// When the response was created
    pub created_at: DateTimeUtc,
    /// When the response was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Response and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each response answers one request
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::RequestId",
        to = "super::request::Column::Id",
        on_delete = "Cascade"
    )]
    Request,
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Job entity - A job posting or role description, optionally tied to a company.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Job database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    /// Unique identifier for the job
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Job title
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// User who posted the job
    pub user_id: i64,
    /// Company offering the job, if any
    pub company_id: Option<i64>,
    /// When the job was created
    pub created_at: DateTimeUtc,
    /// When the job was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Job and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A job may belong to a company
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Project entity - A piece of mentored work, optionally run under a company.
//!
//! `start_date` and `end_date` bound the window in which sessions may be scheduled.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    /// Unique identifier for the project
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Project name
    pub name: String,
    /// What the project is about
    pub description: Option<String>,
    /// Owner (creator) of the project
    pub user_id: i64,
    /// Company running the project, if any
    pub company_id: Option<i64>,
    /// First day sessions may take place
    pub start_date: Option<Date>,
    /// Last day sessions may take place
    pub end_date: Option<Date>,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the project was created
    pub created_at: DateTimeUtc,
    /// When the project was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Project and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each project is owned by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
    /// A project may belong to a company
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    /// One project has many sessions
    #[sea_orm(has_many = "super::project_session::Entity")]
    Sessions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::project_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

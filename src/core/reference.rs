//! Polymorphic entity references.
//!
//! Relations, requests and authorizations point at users, companies and
//! projects through `(kind, id)` column pairs. [`EntityRef`] is the typed form
//! of such a pair.

use crate::{
    entities::{Company, EntityKind, Project, User, company, project, user},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a user, company or project by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// A row in `users`
    User(i64),
    /// A row in `companies`
    Company(i64),
    /// A row in `projects`
    Project(i64),
}

impl EntityRef {
    /// Builds a reference from a stored `(kind, id)` pair.
    #[must_use]
    pub const fn from_parts(kind: EntityKind, id: i64) -> Self {
        match kind {
            EntityKind::User => Self::User(id),
            EntityKind::Company => Self::Company(id),
            EntityKind::Project => Self::Project(id),
        }
    }

    /// Kind half of the pair.
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::User,
            Self::Company(_) => EntityKind::Company,
            Self::Project(_) => EntityKind::Project,
        }
    }

    /// Id half of the pair.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::User(id) | Self::Company(id) | Self::Project(id) => id,
        }
    }

    /// Returns the user id if this points at a user.
    #[must_use]
    pub const fn as_user(self) -> Option<i64> {
        match self {
            Self::User(id) => Some(id),
            _ => None,
        }
    }

    const fn entity_name(self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Company(_) => "company",
            Self::Project(_) => "project",
        }
    }

    /// Fails with [`Error::NotFound`] unless the referenced row exists and is not soft-deleted.
    pub async fn ensure_active<C>(self, db: &C) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let found = match self {
            Self::User(id) => User::find_by_id(id)
                .filter(user::Column::IsDeleted.eq(false))
                .count(db)
                .await?,
            Self::Company(id) => Company::find_by_id(id)
                .filter(company::Column::IsDeleted.eq(false))
                .count(db)
                .await?,
            Self::Project(id) => Project::find_by_id(id)
                .filter(project::Column::IsDeleted.eq(false))
                .count(db)
                .await?,
        };

        if found == 0 {
            return Err(Error::NotFound {
                entity: self.entity_name(),
                id: self.id(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.entity_name(), self.id())
    }
}

impl From<&user::Model> for EntityRef {
    fn from(value: &user::Model) -> Self {
        Self::User(value.id)
    }
}

impl From<&company::Model> for EntityRef {
    fn from(value: &company::Model) -> Self {
        Self::Company(value.id)
    }
}

impl From<&project::Model> for EntityRef {
    fn from(value: &project::Model) -> Self {
        Self::Project(value.id)
    }
}

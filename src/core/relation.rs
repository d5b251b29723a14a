//! Relation business logic - typed links between users and other entities.
//!
//! A `(by, to)` pair holds at most one relationship per context, owners never
//! hold relations to what they own, and nobody is related to themselves.
//! Permission checks live in the calling services; the functions here only
//! guard the data invariants.

use crate::{
    core::reference::EntityRef,
    entities::{
        Company, EntityKind, Project, Relation, RelationshipType, company, project, relation,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

fn pair_filter(
    select: Select<Relation>,
    by: EntityRef,
    to: EntityRef,
) -> Select<Relation> {
    select
        .filter(relation::Column::ByType.eq(by.kind()))
        .filter(relation::Column::ById.eq(by.id()))
        .filter(relation::Column::ToType.eq(to.kind()))
        .filter(relation::Column::ToId.eq(to.id()))
}

/// Checks that `kind` may link `by` to `to` at all.
async fn check_shape<C>(db: &C, by: EntityRef, to: EntityRef, kind: RelationshipType) -> Result<()>
where
    C: ConnectionTrait,
{
    if by.kind() != EntityKind::User {
        return Err(Error::Relation {
            message: format!("only users can hold relations, got {by}"),
        });
    }
    if to.kind() != kind.target_kind() {
        return Err(Error::Relation {
            message: format!("{kind:?} cannot point at {to}"),
        });
    }
    if by == to {
        return Err(Error::Relation {
            message: "a user cannot be related to themselves".to_string(),
        });
    }
    by.ensure_active(db).await?;
    to.ensure_active(db).await?;

    let owner_id = match to {
        EntityRef::Company(id) => Company::find_by_id(id)
            .one(db)
            .await?
            .map(|c: company::Model| c.user_id),
        EntityRef::Project(id) => Project::find_by_id(id)
            .one(db)
            .await?
            .map(|p: project::Model| p.user_id),
        EntityRef::User(_) => None,
    };
    if owner_id == Some(by.id()) {
        return Err(Error::Relation {
            message: format!("{by} owns {to} and cannot also hold {kind:?}"),
        });
    }
    Ok(())
}

/// Finds the relation `by` holds towards `to` within the context of `kind`.
pub async fn find_relation<C>(
    db: &C,
    by: EntityRef,
    to: EntityRef,
    kind: RelationshipType,
) -> Result<Option<relation::Model>>
where
    C: ConnectionTrait,
{
    pair_filter(Relation::find(), by, to)
        .filter(relation::Column::RelationshipType.is_in(kind.siblings().iter().copied()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether `by` holds exactly `kind` towards `to`.
pub async fn has_relation<C>(
    db: &C,
    by: EntityRef,
    to: EntityRef,
    kind: RelationshipType,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(find_relation(db, by, to, kind)
        .await?
        .is_some_and(|r| r.relationship_type == kind))
}

async fn insert_relation<C>(
    db: &C,
    by: EntityRef,
    to: EntityRef,
    kind: RelationshipType,
) -> Result<relation::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let model = relation::ActiveModel {
        by_type: Set(by.kind()),
        by_id: Set(by.id()),
        to_type: Set(to.kind()),
        to_id: Set(to.id()),
        relationship_type: Set(kind),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(%by, %to, ?kind, "relation created");
    Ok(created)
}

/// Creates a relation, replacing any other relation the pair holds in the same context.
///
/// Fails with [`Error::Relation`] if the pair already holds exactly `kind`.
pub async fn create_relation<C>(
    db: &C,
    by: EntityRef,
    to: EntityRef,
    kind: RelationshipType,
) -> Result<relation::Model>
where
    C: ConnectionTrait,
{
    check_shape(db, by, to, kind).await?;

    if let Some(existing) = find_relation(db, by, to, kind).await? {
        if existing.relationship_type == kind {
            return Err(Error::Relation {
                message: format!("{by} already holds {kind:?} towards {to}"),
            });
        }
        debug!(
            "Replacing {:?} with {:?} for {} -> {}",
            existing.relationship_type, kind, by, to
        );
        existing.delete(db).await?;
    }

    insert_relation(db, by, to, kind).await
}

/// Like [`create_relation`], but returns the existing row when the pair already holds `kind`.
pub async fn ensure_relation<C>(
    db: &C,
    by: EntityRef,
    to: EntityRef,
    kind: RelationshipType,
) -> Result<relation::Model>
where
    C: ConnectionTrait,
{
    match find_relation(db, by, to, kind).await? {
        Some(existing) if existing.relationship_type == kind => Ok(existing),
        _ => create_relation(db, by, to, kind).await,
    }
}

/// Deletes the relation `by` holds towards `to` in the context of `kind`, whatever its type.
///
/// Fails with [`Error::Relation`] when there is nothing to delete.
pub async fn delete_relation<C>(
    db: &C,
    by: EntityRef,
    to: EntityRef,
    kind: RelationshipType,
) -> Result<relation::Model>
where
    C: ConnectionTrait,
{
    let existing = find_relation(db, by, to, kind)
        .await?
        .ok_or_else(|| Error::Relation {
            message: format!("{by} holds no {:?} relation towards {to}", kind.context()),
        })?;
    existing.clone().delete(db).await?;
    info!(%by, %to, kind = ?existing.relationship_type, "relation deleted");
    Ok(existing)
}

/// Deletes every relation pointing at `to`; returns how many were removed.
pub async fn delete_relations_to<C>(db: &C, to: EntityRef) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Relation::delete_many()
        .filter(relation::Column::ToType.eq(to.kind()))
        .filter(relation::Column::ToId.eq(to.id()))
        .exec(db)
        .await?;
    debug!("Removed {} relations pointing at {}", result.rows_affected, to);
    Ok(result.rows_affected)
}

/// Relations pointing at `to`, optionally restricted to one type, oldest first.
pub async fn relations_to<C>(
    db: &C,
    to: EntityRef,
    kind: Option<RelationshipType>,
) -> Result<Vec<relation::Model>>
where
    C: ConnectionTrait,
{
    let mut select = Relation::find()
        .filter(relation::Column::ToType.eq(to.kind()))
        .filter(relation::Column::ToId.eq(to.id()));
    if let Some(kind) = kind {
        select = select.filter(relation::Column::RelationshipType.eq(kind));
    }
    select
        .order_by_asc(relation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Relations held by `by`, oldest first.
pub async fn relations_by<C>(db: &C, by: EntityRef) -> Result<Vec<relation::Model>>
where
    C: ConnectionTrait,
{
    Relation::find()
        .filter(relation::Column::ByType.eq(by.kind()))
        .filter(relation::Column::ById.eq(by.id()))
        .order_by_asc(relation::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

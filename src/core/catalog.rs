//! Role and permission catalog.
//!
//! Catalog entries are managed by admins and referenced by authorizations
//! through `(authorization_type, authorization_id)`. An entry that is still
//! referenced cannot be deleted.

use crate::{
    core::policy::{self, Creatable},
    dto::{NamedDto, optional_text, required_name},
    entities::{
        Authorization, AuthorizationKind, Permission, Role, authorization, permission, role, user,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

fn duplicate(kind: AuthorizationKind, name: &str) -> Error {
    Error::Authorization {
        message: format!("{kind:?} '{name}' already exists"),
    }
}

/// Id of the catalog entry of `kind` called `name`, if it exists.
pub async fn find_entry_id<C>(db: &C, kind: AuthorizationKind, name: &str) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let id = match kind {
        AuthorizationKind::Role => Role::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await?
            .map(|r| r.id),
        AuthorizationKind::Permission => Permission::find()
            .filter(permission::Column::Name.eq(name))
            .one(db)
            .await?
            .map(|p| p.id),
    };
    Ok(id)
}

/// Fails with [`Error::NotFound`] unless the catalog entry exists.
pub async fn ensure_entry<C>(db: &C, kind: AuthorizationKind, id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let found = match kind {
        AuthorizationKind::Role => Role::find_by_id(id).count(db).await?,
        AuthorizationKind::Permission => Permission::find_by_id(id).count(db).await?,
    };
    if found == 0 {
        let entity = match kind {
            AuthorizationKind::Role => "role",
            AuthorizationKind::Permission => "permission",
        };
        return Err(Error::NotFound { entity, id });
    }
    Ok(())
}

async fn ensure_unreferenced(db: &DatabaseConnection, kind: AuthorizationKind, id: i64) -> Result<()> {
    let uses = Authorization::find()
        .filter(authorization::Column::AuthorizationType.eq(kind))
        .filter(authorization::Column::AuthorizationId.eq(id))
        .count(db)
        .await?;
    if uses > 0 {
        return Err(Error::Authorization {
            message: format!("{kind:?} #{id} is still granted {uses} time(s)"),
        });
    }
    Ok(())
}

/// Adds a role to the catalog. Admins only.
///
/// # Errors
/// Returns an error if the actor is not an admin, the name is blank, or a role
/// with the same name exists.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn create_role(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: NamedDto,
) -> Result<role::Model> {
    policy::authorize_create(actor, Creatable::Catalog)?;
    let name = required_name(&dto.name, "Role")?;
    if find_entry_id(db, AuthorizationKind::Role, &name).await?.is_some() {
        return Err(duplicate(AuthorizationKind::Role, &name));
    }

    let now = chrono::Utc::now();
    let model = role::ActiveModel {
        name: Set(name),
        description: Set(optional_text(dto.description)),
        user_id: Set(actor.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(role = created.id, name = %created.name, "role created");
    Ok(created)
}

/// Adds a permission to the catalog. Admins only.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn create_permission(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: NamedDto,
) -> Result<permission::Model> {
    policy::authorize_create(actor, Creatable::Catalog)?;
    let name = required_name(&dto.name, "Permission")?;
    if find_entry_id(db, AuthorizationKind::Permission, &name)
        .await?
        .is_some()
    {
        return Err(duplicate(AuthorizationKind::Permission, &name));
    }

    let now = chrono::Utc::now();
    let model = permission::ActiveModel {
        name: Set(name),
        description: Set(optional_text(dto.description)),
        user_id: Set(actor.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(permission = created.id, name = %created.name, "permission created");
    Ok(created)
}

/// All roles ordered by name.
pub async fn get_all_roles(db: &DatabaseConnection) -> Result<Vec<role::Model>> {
    Role::find()
        .order_by_asc(role::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All permissions ordered by name.
pub async fn get_all_permissions(db: &DatabaseConnection) -> Result<Vec<permission::Model>> {
    Permission::find()
        .order_by_asc(permission::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes a role that no authorization references. Admins only.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_role(db: &DatabaseConnection, actor: &user::Model, role_id: i64) -> Result<()> {
    policy::authorize_create(actor, Creatable::Catalog)?;
    let existing = Role::find_by_id(role_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "role",
            id: role_id,
        })?;
    ensure_unreferenced(db, AuthorizationKind::Role, role_id).await?;
    existing.delete(db).await?;
    info!(role = role_id, "role deleted");
    Ok(())
}

/// Removes a permission that no authorization references. Admins only.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_permission(
    db: &DatabaseConnection,
    actor: &user::Model,
    permission_id: i64,
) -> Result<()> {
    policy::authorize_create(actor, Creatable::Catalog)?;
    let existing = Permission::find_by_id(permission_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "permission",
            id: permission_id,
        })?;
    ensure_unreferenced(db, AuthorizationKind::Permission, permission_id).await?;
    existing.delete(db).await?;
    info!(permission = permission_id, "permission deleted");
    Ok(())
}

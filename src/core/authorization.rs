//! Authorization grants - "user X grants role/permission Y, scoped to entity Z, to user W".
//!
//! Grants are scoped to a company or project. The grantor needs the `Grant`
//! action on the scope and the receiving user must own it or be related to it.

use crate::{
    core::{
        catalog,
        policy::{self, Action, Standing},
        reference::EntityRef,
        user::find_active_user,
    },
    dto::AuthorizationDto,
    entities::{Authorization, AuthorizationKind, User, authorization, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

fn scope_filter(scope: EntityRef) -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(authorization::Column::AuthorizableType.eq(scope.kind()))
        .add(authorization::Column::AuthorizableId.eq(scope.id()))
}

/// Grants a role or permission on a company or project.
///
/// # Errors
/// Returns an error if:
/// - The scope is not a company or project, or is missing
/// - The actor may not grant on the scope
/// - The role or permission does not exist
/// - The receiving user is unrelated to the scope
/// - The same grant already exists
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn grant_authorization(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: AuthorizationDto,
) -> Result<authorization::Model> {
    let scope = dto.authorizable;
    if scope.as_user().is_some() {
        return Err(Error::validation(
            "authorizations are scoped to a company or a project",
        ));
    }
    policy::authorize(db, actor, scope, Action::Grant).await?;
    catalog::ensure_entry(db, dto.authorization_type, dto.authorization_id).await?;

    let authorized = find_active_user(db, dto.authorized_id).await?;
    if policy::standing_of(db, &authorized, scope).await? == Standing::Stranger {
        return Err(Error::Authorization {
            message: format!("user #{} is not part of {scope}", authorized.id),
        });
    }

    let existing = Authorization::find()
        .filter(scope_filter(scope))
        .filter(authorization::Column::AuthorizationType.eq(dto.authorization_type))
        .filter(authorization::Column::AuthorizationId.eq(dto.authorization_id))
        .filter(authorization::Column::AuthorizedId.eq(authorized.id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(Error::Authorization {
            message: format!(
                "user #{} already holds {:?} #{} on {scope}",
                authorized.id, dto.authorization_type, dto.authorization_id
            ),
        });
    }

    let now = chrono::Utc::now();
    let model = authorization::ActiveModel {
        user_id: Set(actor.id),
        authorizable_type: Set(scope.kind()),
        authorizable_id: Set(scope.id()),
        authorization_type: Set(dto.authorization_type),
        authorization_id: Set(dto.authorization_id),
        authorized_id: Set(authorized.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(
        authorization = created.id,
        authorized = created.authorized_id,
        %scope,
        "authorization granted"
    );
    Ok(created)
}

/// Removes a grant. Allowed for the grantor, the authorized user and admins.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn revoke_authorization(
    db: &DatabaseConnection,
    actor: &user::Model,
    authorization_id: i64,
) -> Result<()> {
    let existing = Authorization::find_by_id(authorization_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "authorization",
            id: authorization_id,
        })?;
    // officials of the scope get no say; only account-wide Revoke rights count
    let allowed = existing.user_id == actor.id
        || existing.authorized_id == actor.id
        || policy::is_allowed(actor.user_type, Standing::Stranger, Action::Revoke);
    if !allowed {
        return Err(Error::forbidden(format!(
            "user #{} may not revoke authorization #{authorization_id}",
            actor.id
        )));
    }
    existing.delete(db).await?;
    info!(authorization = authorization_id, "authorization revoked");
    Ok(())
}

/// Grants scoped to a company or project.
pub async fn authorizations_for(
    db: &DatabaseConnection,
    scope: EntityRef,
) -> Result<Vec<authorization::Model>> {
    Authorization::find()
        .filter(scope_filter(scope))
        .order_by_asc(authorization::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Grants held by a user across all scopes.
pub async fn authorizations_of_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<authorization::Model>> {
    Authorization::find()
        .filter(authorization::Column::AuthorizedId.eq(user_id))
        .order_by_asc(authorization::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Whether `user_id` holds the role or permission called `name` on `scope`.
pub async fn has_authorization(
    db: &DatabaseConnection,
    user_id: i64,
    scope: EntityRef,
    kind: AuthorizationKind,
    name: &str,
) -> Result<bool> {
    let Some(entry_id) = catalog::find_entry_id(db, kind, name).await? else {
        debug!(name, ?kind, "unknown catalog entry");
        return Ok(false);
    };
    let held = Authorization::find()
        .filter(scope_filter(scope))
        .filter(authorization::Column::AuthorizationType.eq(kind))
        .filter(authorization::Column::AuthorizationId.eq(entry_id))
        .filter(authorization::Column::AuthorizedId.eq(user_id))
        .count(db)
        .await?;
    Ok(held > 0)
}

/// Drops every grant scoped to `scope`; used when the scope is deleted.
pub async fn delete_authorizations_for<C>(db: &C, scope: EntityRef) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Authorization::delete_many()
        .filter(scope_filter(scope))
        .exec(db)
        .await?;
    debug!(%scope, removed = result.rows_affected, "authorizations dropped");
    Ok(result.rows_affected)
}

/// Drops `user_id`'s grants on `scope` once the user no longer stands in it.
///
/// Called after a relation to the scope is removed; a user who is still an
/// owner or official there through another path keeps their grants.
pub async fn drop_grants_if_unrelated<C>(db: &C, user_id: i64, scope: EntityRef) -> Result<u64>
where
    C: ConnectionTrait,
{
    let still_related = match User::find_by_id(user_id).one(db).await? {
        Some(holder) => policy::standing_of(db, &holder, scope).await? != Standing::Stranger,
        None => false,
    };
    if still_related {
        return Ok(0);
    }
    let result = Authorization::delete_many()
        .filter(scope_filter(scope))
        .filter(authorization::Column::AuthorizedId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        info!(user = user_id, %scope, removed = result.rows_affected, "grants dropped with relation");
    }
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{company, relation};
    use crate::dto::NamedDto;
    use crate::entities::{RelationshipType, UserType};
    use crate::test_utils::*;

    struct Fixture {
        db: DatabaseConnection,
        admin: user::Model,
        owner: user::Model,
        member: user::Model,
        stranger: user::Model,
        scope: EntityRef,
        role_id: i64,
    }

    async fn fixture() -> Result<Fixture> {
        let db = setup_test_db().await?;
        let admin = create_test_user(&db, "Admin", UserType::Admin).await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let member = create_test_user(&db, "Member", UserType::Learner).await?;
        let stranger = create_test_user(&db, "Stranger", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;
        let scope = EntityRef::from(&acme);
        relation::create_relation(
            &db,
            EntityRef::from(&member),
            scope,
            RelationshipType::CompanyMember,
        )
        .await?;
        let role = catalog::create_role(
            &db,
            &admin,
            NamedDto {
                name: "mentor".to_string(),
                description: None,
            },
        )
        .await?;
        Ok(Fixture {
            db,
            admin,
            owner,
            member,
            stranger,
            scope,
            role_id: role.id,
        })
    }

    fn grant(f: &Fixture, authorized_id: i64) -> AuthorizationDto {
        AuthorizationDto {
            authorizable: f.scope,
            authorization_type: AuthorizationKind::Role,
            authorization_id: f.role_id,
            authorized_id,
        }
    }

    #[tokio::test]
    async fn test_grant_authorization() -> Result<()> {
        let f = fixture().await?;

        let granted = grant_authorization(&f.db, &f.owner, grant(&f, f.member.id)).await?;
        assert_eq!(granted.user_id, f.owner.id);
        assert!(
            has_authorization(&f.db, f.member.id, f.scope, AuthorizationKind::Role, "mentor")
                .await?
        );
        assert!(
            !has_authorization(&f.db, f.member.id, f.scope, AuthorizationKind::Permission, "mentor")
                .await?
        );

        let twice = grant_authorization(&f.db, &f.owner, grant(&f, f.member.id)).await;
        assert!(matches!(twice, Err(Error::Authorization { .. })));

        // the owner can receive grants on their own company
        grant_authorization(&f.db, &f.owner, grant(&f, f.owner.id)).await?;
        assert_eq!(authorizations_for(&f.db, f.scope).await?.len(), 2);
        assert_eq!(authorizations_of_user(&f.db, f.member.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_grant_rules() -> Result<()> {
        let f = fixture().await?;

        let unrelated = grant_authorization(&f.db, &f.owner, grant(&f, f.stranger.id)).await;
        assert!(matches!(unrelated, Err(Error::Authorization { .. })));

        let by_member = grant_authorization(&f.db, &f.member, grant(&f, f.member.id)).await;
        assert!(matches!(by_member, Err(Error::Forbidden { .. })));

        let mut unknown = grant(&f, f.member.id);
        unknown.authorization_id = 999;
        let unknown = grant_authorization(&f.db, &f.owner, unknown).await;
        assert!(matches!(unknown, Err(Error::NotFound { .. })));

        let mut on_user = grant(&f, f.member.id);
        on_user.authorizable = EntityRef::from(&f.member);
        let on_user = grant_authorization(&f.db, &f.admin, on_user).await;
        assert!(matches!(on_user, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_revoke_authorization() -> Result<()> {
        let f = fixture().await?;
        let granted = grant_authorization(&f.db, &f.owner, grant(&f, f.member.id)).await?;

        let by_stranger = revoke_authorization(&f.db, &f.stranger, granted.id).await;
        assert!(matches!(by_stranger, Err(Error::Forbidden { .. })));

        // referenced catalog entries cannot be removed
        let in_use = catalog::delete_role(&f.db, &f.admin, f.role_id).await;
        assert!(matches!(in_use, Err(Error::Authorization { .. })));

        revoke_authorization(&f.db, &f.member, granted.id).await?;
        assert!(authorizations_for(&f.db, f.scope).await?.is_empty());
        catalog::delete_role(&f.db, &f.admin, f.role_id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_company_drops_grants() -> Result<()> {
        let f = fixture().await?;
        grant_authorization(&f.db, &f.owner, grant(&f, f.member.id)).await?;

        company::delete_company(&f.db, &f.owner, f.scope.id()).await?;
        assert!(authorizations_of_user(&f.db, f.member.id).await?.is_empty());
        Ok(())
    }
}

//! Company business logic - lifecycle, membership and administrators.
//!
//! Owners and admins may delete a company. Owners, company administrators and
//! admins may edit it and manage its members. Members may leave; owners may not.

use crate::{
    core::{
        authorization,
        policy::{self, Action, Creatable, Standing},
        reference::EntityRef,
        relation, request,
        user::find_active_user,
    },
    dto::{CompanyDto, UpdateCompanyDto, optional_text, required_name},
    entities::{Company, RelationshipType, User, company, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

async fn ensure_name_free<C>(db: &C, name: &str, except: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut select = Company::find()
        .filter(company::Column::Name.eq(name))
        .filter(company::Column::IsDeleted.eq(false));
    if let Some(id) = except {
        select = select.filter(company::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(Error::Company {
            message: format!("a company named '{name}' already exists"),
        });
    }
    Ok(())
}

/// Creates a company owned by `actor`.
///
/// # Errors
/// Returns an error if:
/// - The actor's account type cannot create companies
/// - The name is blank or already used by an active company
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn create_company(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: CompanyDto,
) -> Result<company::Model> {
    policy::authorize_create(actor, Creatable::Company)?;
    let name = required_name(&dto.name, "Company")?;
    ensure_name_free(db, &name, None).await?;

    let now = chrono::Utc::now();
    let model = company::ActiveModel {
        name: Set(name),
        about: Set(optional_text(dto.about)),
        user_id: Set(actor.id),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(company = created.id, "company created");
    Ok(created)
}

/// Finds an active company by id.
pub async fn get_company(
    db: &DatabaseConnection,
    company_id: i64,
) -> Result<Option<company::Model>> {
    Company::find_by_id(company_id)
        .filter(company::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active company or fails with [`Error::NotFound`].
pub async fn find_active_company<C>(db: &C, company_id: i64) -> Result<company::Model>
where
    C: ConnectionTrait,
{
    Company::find_by_id(company_id)
        .filter(company::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "company",
            id: company_id,
        })
}

/// All active companies ordered by name.
pub async fn get_all_active_companies(db: &DatabaseConnection) -> Result<Vec<company::Model>> {
    Company::find()
        .filter(company::Column::IsDeleted.eq(false))
        .order_by_asc(company::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active companies owned by `user_id`.
pub async fn companies_owned_by(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<company::Model>> {
    Company::find()
        .filter(company::Column::UserId.eq(user_id))
        .filter(company::Column::IsDeleted.eq(false))
        .order_by_asc(company::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates name and description.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn update_company(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
    dto: UpdateCompanyDto,
) -> Result<company::Model> {
    policy::authorize(db, actor, EntityRef::Company(company_id), Action::Update).await?;
    let existing = find_active_company(db, company_id).await?;

    let mut model: company::ActiveModel = existing.into();
    if let Some(name) = dto.name {
        let name = required_name(&name, "Company")?;
        ensure_name_free(db, &name, Some(company_id)).await?;
        model.name = Set(name);
    }
    if dto.about.is_some() {
        model.about = Set(optional_text(dto.about));
    }
    model.updated_at = Set(chrono::Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Soft deletes a company, dropping its relations and pending requests about it.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_company(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
) -> Result<company::Model> {
    policy::authorize(db, actor, EntityRef::Company(company_id), Action::Delete).await?;
    let existing = find_active_company(db, company_id).await?;

    let txn = db.begin().await?;
    let target = EntityRef::Company(company_id);
    relation::delete_relations_to(&txn, target).await?;
    authorization::delete_authorizations_for(&txn, target).await?;
    request::delete_pending_regarding(&txn, target).await?;

    let mut model: company::ActiveModel = existing.into();
    model.is_deleted = Set(true);
    model.updated_at = Set(chrono::Utc::now());
    let deleted = model.update(&txn).await?;
    txn.commit().await?;

    info!(company = company_id, "company soft-deleted");
    Ok(deleted)
}

/// Adds `user_id` as a member directly, without an invitation.
///
/// Users who already belong to the company are refused; changing an
/// administrator's rank goes through [`revoke_administrator`].
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn add_member(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
    user_id: i64,
) -> Result<()> {
    let target = EntityRef::Company(company_id);
    policy::authorize(db, actor, target, Action::ManageMembers).await?;
    let by = EntityRef::User(user_id);
    if let Some(existing) =
        relation::find_relation(db, by, target, RelationshipType::CompanyMember).await?
    {
        return Err(Error::Company {
            message: format!(
                "user #{user_id} already holds {:?} in company #{company_id}",
                existing.relationship_type
            ),
        });
    }
    relation::create_relation(db, by, target, RelationshipType::CompanyMember).await?;
    Ok(())
}

/// Removes a member or administrator. Only owners and admins may remove administrators.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn remove_member(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
    user_id: i64,
) -> Result<()> {
    let target = EntityRef::Company(company_id);
    let standing = policy::authorize(db, actor, target, Action::ManageMembers).await?;

    let removing_admin = relation::has_relation(
        db,
        EntityRef::User(user_id),
        target,
        RelationshipType::CompanyAdministrator,
    )
    .await?;
    if removing_admin && standing != Standing::Owner && !actor.user_type.is_admin() {
        return Err(Error::forbidden(
            "only the owner can remove a company administrator",
        ));
    }

    let txn = db.begin().await?;
    relation::delete_relation(
        &txn,
        EntityRef::User(user_id),
        target,
        RelationshipType::CompanyMember,
    )
    .await?;
    authorization::drop_grants_if_unrelated(&txn, user_id, target).await?;
    txn.commit().await?;
    Ok(())
}

/// Drops the actor's own membership. Owners cannot leave their company.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn leave_company(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
) -> Result<()> {
    let target = EntityRef::Company(company_id);
    let standing = policy::standing_of(db, actor, target).await?;
    if standing == Standing::Owner {
        return Err(Error::Company {
            message: "the owner cannot leave their own company".to_string(),
        });
    }
    policy::authorize(db, actor, target, Action::Leave).await?;
    let txn = db.begin().await?;
    relation::delete_relation(
        &txn,
        EntityRef::from(actor),
        target,
        RelationshipType::CompanyMember,
    )
    .await?;
    authorization::drop_grants_if_unrelated(&txn, actor.id, target).await?;
    txn.commit().await?;
    info!(company = company_id, user = actor.id, "user left company");
    Ok(())
}

async fn require_owner_or_admin(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
) -> Result<()> {
    let standing = policy::standing_of(db, actor, EntityRef::Company(company_id)).await?;
    if standing == Standing::Owner || actor.user_type.is_admin() {
        return Ok(());
    }
    Err(Error::forbidden(
        "only the owner can change company administrators",
    ))
}

/// Promotes `user_id` to company administrator, replacing a plain membership.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn make_administrator(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
    user_id: i64,
) -> Result<()> {
    require_owner_or_admin(db, actor, company_id).await?;
    relation::create_relation(
        db,
        EntityRef::User(user_id),
        EntityRef::Company(company_id),
        RelationshipType::CompanyAdministrator,
    )
    .await?;
    Ok(())
}

/// Demotes a company administrator back to a plain member.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn revoke_administrator(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: i64,
    user_id: i64,
) -> Result<()> {
    require_owner_or_admin(db, actor, company_id).await?;
    let (by, to) = (EntityRef::User(user_id), EntityRef::Company(company_id));
    if !relation::has_relation(db, by, to, RelationshipType::CompanyAdministrator).await? {
        return Err(Error::Company {
            message: format!("user #{user_id} is not an administrator of company #{company_id}"),
        });
    }
    relation::create_relation(db, by, to, RelationshipType::CompanyMember).await?;
    Ok(())
}

async fn users_related(
    db: &DatabaseConnection,
    company_id: i64,
    kind: Option<RelationshipType>,
) -> Result<Vec<user::Model>> {
    find_active_company(db, company_id).await?;
    let ids: Vec<i64> = relation::relations_to(db, EntityRef::Company(company_id), kind)
        .await?
        .into_iter()
        .filter_map(|r| EntityRef::from_parts(r.by_type, r.by_id).as_user())
        .collect();
    User::find()
        .filter(user::Column::Id.is_in(ids))
        .filter(user::Column::IsDeleted.eq(false))
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Everyone holding a company relation (members and administrators), by name.
pub async fn members(db: &DatabaseConnection, company_id: i64) -> Result<Vec<user::Model>> {
    users_related(db, company_id, None).await
}

/// Company administrators, by name.
pub async fn administrators(
    db: &DatabaseConnection,
    company_id: i64,
) -> Result<Vec<user::Model>> {
    users_related(db, company_id, Some(RelationshipType::CompanyAdministrator)).await
}

/// Whether `user_id` is the owner or an administrator of the company.
pub async fn is_official(db: &DatabaseConnection, user_id: i64, company_id: i64) -> Result<bool> {
    let user = find_active_user(db, user_id).await?;
    let standing = policy::standing_of(db, &user, EntityRef::Company(company_id)).await?;
    Ok(matches!(standing, Standing::Owner | Standing::Official))
}

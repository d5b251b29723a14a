//! User business logic - account creation, lookup, updates and soft deletion.

use crate::{
    core::{
        policy::{self, Action},
        reference::EntityRef,
    },
    dto::{UpdateUserDto, UserDto, required_name},
    entities::{User, UserType, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(Error::validation(format!("'{email}' is not a valid email")));
    }
    Ok(email)
}

async fn ensure_email_free<C>(db: &C, email: &str, except: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut select = User::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        select = select.filter(user::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(Error::User {
            message: format!("email {email} is already registered"),
        });
    }
    Ok(())
}

/// Registers a new account.
///
/// # Errors
/// Returns an error if:
/// - The name is blank or the email malformed
/// - The email is already registered
pub async fn create_user(db: &DatabaseConnection, dto: UserDto) -> Result<user::Model> {
    let name = required_name(&dto.name, "User")?;
    let email = normalize_email(&dto.email)?;
    ensure_email_free(db, &email, None).await?;

    let now = chrono::Utc::now();
    let model = user::ActiveModel {
        name: Set(name),
        email: Set(email),
        user_type: Set(dto.user_type),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(user = created.id, user_type = ?created.user_type, "user created");
    Ok(created)
}

/// Finds a user by id, including soft-deleted accounts.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds an active user or fails with [`Error::NotFound`].
pub async fn find_active_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .filter(user::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "user",
            id: user_id,
        })
}

/// Finds an active user by email (case-insensitive).
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .filter(user::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All active users ordered by name.
pub async fn get_active_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .filter(user::Column::IsDeleted.eq(false))
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates a user's profile. Users may edit themselves; admins may edit anyone.
///
/// Changing `user_type` requires an admin, and only a super admin may hand out
/// the super admin type.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn update_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: i64,
    dto: UpdateUserDto,
) -> Result<user::Model> {
    policy::authorize(db, actor, EntityRef::User(user_id), Action::Update).await?;
    let target = find_active_user(db, user_id).await?;

    if target.user_type == UserType::SuperAdmin
        && actor.user_type != UserType::SuperAdmin
    {
        return Err(Error::forbidden("only super admins may edit super admins"));
    }

    let mut model: user::ActiveModel = target.into();
    if let Some(name) = dto.name {
        model.name = Set(required_name(&name, "User")?);
    }
    if let Some(email) = dto.email {
        let email = normalize_email(&email)?;
        ensure_email_free(db, &email, Some(user_id)).await?;
        model.email = Set(email);
    }
    if let Some(user_type) = dto.user_type {
        if !actor.user_type.is_admin() {
            return Err(Error::forbidden("only admins may change account types"));
        }
        if user_type == UserType::SuperAdmin && actor.user_type != UserType::SuperAdmin {
            return Err(Error::forbidden("only super admins may create super admins"));
        }
        model.user_type = Set(user_type);
    }
    model.updated_at = Set(chrono::Utc::now());

    model.update(db).await.map_err(Into::into)
}

/// Soft deletes an account. Users may delete themselves; admins may delete
/// anyone except super admins, who can only be removed by another super admin.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    user_id: i64,
) -> Result<user::Model> {
    policy::authorize(db, actor, EntityRef::User(user_id), Action::Delete).await?;
    let target = find_active_user(db, user_id).await?;

    if target.user_type == UserType::SuperAdmin && actor.user_type != UserType::SuperAdmin {
        return Err(Error::User {
            message: "super admins can only be removed by super admins".to_string(),
        });
    }

    let mut model: user::ActiveModel = target.into();
    model.is_deleted = Set(true);
    model.updated_at = Set(chrono::Utc::now());
    let deleted = model.update(db).await?;
    info!(user = deleted.id, "user soft-deleted");
    Ok(deleted)
}

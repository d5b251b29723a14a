//! Level business logic.
//!
//! Levels form a per-creator ladder ordered by `value`. Values are
//! non-negative and unique within one creator's ladder.

use crate::{
    core::policy::{self, Creatable},
    dto::{LevelDto, optional_text, required_name},
    entities::{Level, level, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

async fn check_value(
    db: &DatabaseConnection,
    user_id: i64,
    value: i32,
    except: Option<i64>,
) -> Result<()> {
    if value < 0 {
        return Err(Error::validation(format!(
            "level value must be zero or positive, got {value}"
        )));
    }
    let mut select = Level::find()
        .filter(level::Column::UserId.eq(user_id))
        .filter(level::Column::Value.eq(value));
    if let Some(id) = except {
        select = select.filter(level::Column::Id.ne(id));
    }
    if let Some(taken) = select.one(db).await? {
        return Err(Error::Level {
            message: format!("value {value} is already used by level '{}'", taken.name),
        });
    }
    Ok(())
}

/// Adds a level to the actor's ladder.
///
/// # Errors
/// Returns an error if:
/// - The actor's account type cannot create levels
/// - The value is negative or already taken in the actor's ladder
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn create_level(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: LevelDto,
) -> Result<level::Model> {
    policy::authorize_create(actor, Creatable::Level)?;
    let name = required_name(&dto.name, "Level")?;
    check_value(db, actor.id, dto.value, None).await?;

    let now = chrono::Utc::now();
    let model = level::ActiveModel {
        name: Set(name),
        description: Set(optional_text(dto.description)),
        value: Set(dto.value),
        user_id: Set(actor.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(level = created.id, value = created.value, "level created");
    Ok(created)
}

/// Finds a level by id or fails with [`Error::NotFound`].
pub async fn get_level(db: &DatabaseConnection, level_id: i64) -> Result<level::Model> {
    Level::find_by_id(level_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "level",
            id: level_id,
        })
}

/// A creator's ladder, lowest value first.
pub async fn levels_of(db: &DatabaseConnection, user_id: i64) -> Result<Vec<level::Model>> {
    Level::find()
        .filter(level::Column::UserId.eq(user_id))
        .order_by_asc(level::Column::Value)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every level on the platform.
pub async fn get_all_levels(db: &DatabaseConnection) -> Result<Vec<level::Model>> {
    Level::find()
        .order_by_asc(level::Column::UserId)
        .order_by_asc(level::Column::Value)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Rewrites a level. Creator or admin only; the value stays unique in the
/// creator's ladder.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn update_level(
    db: &DatabaseConnection,
    actor: &user::Model,
    level_id: i64,
    dto: LevelDto,
) -> Result<level::Model> {
    let existing = get_level(db, level_id).await?;
    policy::authorize_creator(actor, existing.user_id, Creatable::Level)?;
    let name = required_name(&dto.name, "Level")?;
    check_value(db, existing.user_id, dto.value, Some(level_id)).await?;

    let mut model: level::ActiveModel = existing.into();
    model.name = Set(name);
    model.description = Set(optional_text(dto.description));
    model.value = Set(dto.value);
    model.updated_at = Set(chrono::Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Deletes a level. Creator or admin only.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_level(db: &DatabaseConnection, actor: &user::Model, level_id: i64) -> Result<()> {
    let existing = get_level(db, level_id).await?;
    policy::authorize_creator(actor, existing.user_id, Creatable::Level)?;
    existing.delete(db).await?;
    info!(level = level_id, "level deleted");
    Ok(())
}

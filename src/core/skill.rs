//! Skill business logic.

use crate::{
    core::policy::{self, Creatable},
    dto::{NamedDto, optional_text, required_name},
    entities::{Skill, skill, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

async fn ensure_name_free(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
    except: Option<i64>,
) -> Result<()> {
    let mut select = Skill::find()
        .filter(skill::Column::UserId.eq(user_id))
        .filter(skill::Column::Name.eq(name));
    if let Some(id) = except {
        select = select.filter(skill::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(Error::Skill {
            message: format!("skill '{name}' already exists"),
        });
    }
    Ok(())
}

/// Creates a skill owned by `actor`.
///
/// # Errors
/// Returns an error if:
/// - The actor's account type cannot create skills
/// - The name is blank or already used by one of the actor's skills
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn create_skill(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: NamedDto,
) -> Result<skill::Model> {
    policy::authorize_create(actor, Creatable::Skill)?;
    let name = required_name(&dto.name, "Skill")?;
    ensure_name_free(db, actor.id, &name, None).await?;

    let now = chrono::Utc::now();
    let model = skill::ActiveModel {
        name: Set(name),
        description: Set(optional_text(dto.description)),
        user_id: Set(actor.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(skill = created.id, "skill created");
    Ok(created)
}

/// Finds a skill by id or fails with [`Error::NotFound`].
pub async fn get_skill(db: &DatabaseConnection, skill_id: i64) -> Result<skill::Model> {
    Skill::find_by_id(skill_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "skill",
            id: skill_id,
        })
}

/// All skills ordered by name.
pub async fn get_all_skills(db: &DatabaseConnection) -> Result<Vec<skill::Model>> {
    Skill::find()
        .order_by_asc(skill::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Renames or re-describes a skill. Creator or admin only.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn update_skill(
    db: &DatabaseConnection,
    actor: &user::Model,
    skill_id: i64,
    dto: NamedDto,
) -> Result<skill::Model> {
    let existing = get_skill(db, skill_id).await?;
    policy::authorize_creator(actor, existing.user_id, Creatable::Skill)?;
    let name = required_name(&dto.name, "Skill")?;
    ensure_name_free(db, existing.user_id, &name, Some(skill_id)).await?;

    let mut model: skill::ActiveModel = existing.into();
    model.name = Set(name);
    model.description = Set(optional_text(dto.description));
    model.updated_at = Set(chrono::Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Deletes a skill. Creator or admin only.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_skill(db: &DatabaseConnection, actor: &user::Model, skill_id: i64) -> Result<()> {
    let existing = get_skill(db, skill_id).await?;
    policy::authorize_creator(actor, existing.user_id, Creatable::Skill)?;
    existing.delete(db).await?;
    info!(skill = skill_id, "skill deleted");
    Ok(())
}

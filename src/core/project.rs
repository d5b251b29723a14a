//! Project business logic - lifecycle and participants.
//!
//! Projects may run under a company; in that case the company's owner stands
//! as a project owner and its administrators as project officials.

use crate::{
    core::{
        authorization,
        policy::{self, Action, Creatable, Standing},
        reference::EntityRef,
        relation, request, session,
        user::find_active_user,
    },
    dto::{ProjectDto, UpdateProjectDto, optional_text, required_name},
    entities::{Project, RelationContext, RelationshipType, User, UserType, project, user},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(Error::Project {
            message: format!("project cannot end ({end}) before it starts ({start})"),
        }),
        _ => Ok(()),
    }
}

/// Creates a project owned by `actor`, optionally under a company the actor runs.
///
/// # Errors
/// Returns an error if:
/// - The actor's account type cannot create projects
/// - `company_id` is set and the actor is not an owner or official of it
/// - The name is blank or the dates are inverted
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn create_project(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: ProjectDto,
) -> Result<project::Model> {
    policy::authorize_create(actor, Creatable::Project)?;
    let name = required_name(&dto.name, "Project")?;
    check_dates(dto.start_date, dto.end_date)?;
    if let Some(company_id) = dto.company_id {
        policy::authorize(db, actor, EntityRef::Company(company_id), Action::Create).await?;
    }

    let now = chrono::Utc::now();
    let model = project::ActiveModel {
        name: Set(name),
        description: Set(optional_text(dto.description)),
        user_id: Set(actor.id),
        company_id: Set(dto.company_id),
        start_date: Set(dto.start_date),
        end_date: Set(dto.end_date),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(project = created.id, company = ?created.company_id, "project created");
    Ok(created)
}

/// Finds an active project by id.
pub async fn get_project(
    db: &DatabaseConnection,
    project_id: i64,
) -> Result<Option<project::Model>> {
    Project::find_by_id(project_id)
        .filter(project::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active project or fails with [`Error::NotFound`].
pub async fn find_active_project<C>(db: &C, project_id: i64) -> Result<project::Model>
where
    C: ConnectionTrait,
{
    Project::find_by_id(project_id)
        .filter(project::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "project",
            id: project_id,
        })
}

/// All active projects ordered by name.
pub async fn get_all_active_projects(db: &DatabaseConnection) -> Result<Vec<project::Model>> {
    Project::find()
        .filter(project::Column::IsDeleted.eq(false))
        .order_by_asc(project::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active projects run under a company.
pub async fn projects_for_company(
    db: &DatabaseConnection,
    company_id: i64,
) -> Result<Vec<project::Model>> {
    Project::find()
        .filter(project::Column::CompanyId.eq(company_id))
        .filter(project::Column::IsDeleted.eq(false))
        .order_by_asc(project::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates name, description and dates.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn update_project(
    db: &DatabaseConnection,
    actor: &user::Model,
    project_id: i64,
    dto: UpdateProjectDto,
) -> Result<project::Model> {
    policy::authorize(db, actor, EntityRef::Project(project_id), Action::Update).await?;
    let existing = find_active_project(db, project_id).await?;

    let start = dto.start_date.or(existing.start_date);
    let end = dto.end_date.or(existing.end_date);
    check_dates(start, end)?;

    let mut model: project::ActiveModel = existing.into();
    if let Some(name) = dto.name {
        model.name = Set(required_name(&name, "Project")?);
    }
    if dto.description.is_some() {
        model.description = Set(optional_text(dto.description));
    }
    model.start_date = Set(start);
    model.end_date = Set(end);
    model.updated_at = Set(chrono::Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Soft deletes a project, dropping its participants, sessions, grants and
/// pending requests about it.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_project(
    db: &DatabaseConnection,
    actor: &user::Model,
    project_id: i64,
) -> Result<project::Model> {
    let target = EntityRef::Project(project_id);
    policy::authorize(db, actor, target, Action::Delete).await?;
    let existing = find_active_project(db, project_id).await?;

    let txn = db.begin().await?;
    relation::delete_relations_to(&txn, target).await?;
    authorization::delete_authorizations_for(&txn, target).await?;
    request::delete_pending_regarding(&txn, target).await?;
    session::delete_sessions_for(&txn, project_id).await?;
    let mut model: project::ActiveModel = existing.into();
    model.is_deleted = Set(true);
    model.updated_at = Set(chrono::Utc::now());
    let deleted = model.update(&txn).await?;
    txn.commit().await?;

    info!(project = project_id, "project soft-deleted");
    Ok(deleted)
}

/// Adds a facilitator or learner directly.
///
/// Facilitators must have a facilitator or admin account.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn add_participant(
    db: &DatabaseConnection,
    actor: &user::Model,
    project_id: i64,
    user_id: i64,
    kind: RelationshipType,
) -> Result<()> {
    if kind.context() != RelationContext::Project {
        return Err(Error::validation(format!(
            "{kind:?} is not a project relationship"
        )));
    }
    let target = EntityRef::Project(project_id);
    let standing = policy::authorize(db, actor, target, Action::ManageMembers).await?;

    let participant = find_active_user(db, user_id).await?;
    if kind == RelationshipType::ProjectFacilitator
        && !matches!(
            participant.user_type,
            UserType::Facilitator | UserType::Admin | UserType::SuperAdmin
        )
    {
        return Err(Error::Project {
            message: format!("user #{user_id} cannot facilitate projects"),
        });
    }

    let by = EntityRef::User(user_id);
    let demoting = relation::has_relation(db, by, target, RelationshipType::ProjectFacilitator)
        .await?
        && kind != RelationshipType::ProjectFacilitator;
    if demoting {
        require_owner_or_admin(actor, standing)?;
    }

    relation::create_relation(db, by, target, kind).await?;
    Ok(())
}

fn require_owner_or_admin(actor: &user::Model, standing: Standing) -> Result<()> {
    if standing == Standing::Owner || actor.user_type.is_admin() {
        return Ok(());
    }
    Err(Error::forbidden(
        "only the project owner can remove or demote a facilitator",
    ))
}

/// Removes a participant. Only owners and admins may remove facilitators.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn remove_participant(
    db: &DatabaseConnection,
    actor: &user::Model,
    project_id: i64,
    user_id: i64,
) -> Result<()> {
    let target = EntityRef::Project(project_id);
    let standing = policy::authorize(db, actor, target, Action::ManageMembers).await?;
    let by = EntityRef::User(user_id);
    if relation::has_relation(db, by, target, RelationshipType::ProjectFacilitator).await? {
        require_owner_or_admin(actor, standing)?;
    }

    let txn = db.begin().await?;
    relation::delete_relation(&txn, by, target, RelationshipType::ProjectLearner).await?;
    authorization::drop_grants_if_unrelated(&txn, user_id, target).await?;
    txn.commit().await?;
    Ok(())
}

/// Drops the actor's own participation. Owners cannot leave their project.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn leave_project(
    db: &DatabaseConnection,
    actor: &user::Model,
    project_id: i64,
) -> Result<()> {
    let target = EntityRef::Project(project_id);
    if policy::standing_of(db, actor, target).await? == Standing::Owner {
        return Err(Error::Project {
            message: "owners cannot leave their own project".to_string(),
        });
    }
    policy::authorize(db, actor, target, Action::Leave).await?;
    let txn = db.begin().await?;
    relation::delete_relation(
        &txn,
        EntityRef::from(actor),
        target,
        RelationshipType::ProjectLearner,
    )
    .await?;
    authorization::drop_grants_if_unrelated(&txn, actor.id, target).await?;
    txn.commit().await?;
    Ok(())
}

/// Participants of a project, optionally restricted to one relationship type, by name.
pub async fn participants(
    db: &DatabaseConnection,
    project_id: i64,
    kind: Option<RelationshipType>,
) -> Result<Vec<user::Model>> {
    find_active_project(db, project_id).await?;
    let ids: Vec<i64> = relation::relations_to(db, EntityRef::Project(project_id), kind)
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

//! Session scheduling - timed meetings inside a project.
//!
//! A session must start before it ends, must not start in the past, must lie
//! inside the project's date window when the project has one, and must not
//! overlap another session run by the same facilitator.

use crate::{
    core::{
        policy::{self, Action},
        project::find_active_project,
        reference::EntityRef,
        relation,
    },
    dto::{SessionDto, required_name},
    entities::{ProjectSession, RelationshipType, project, project_session, user},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

/// Checks the time window of a session against the clock and the project dates.
///
/// # Errors
/// Returns [`Error::Session`] describing the first violated rule.
pub fn check_window(
    project: &project::Model,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    if start_at >= end_at {
        return Err(Error::Session {
            message: "a session must start before it ends".to_string(),
        });
    }
    if start_at < now {
        return Err(Error::Session {
            message: "a session cannot start in the past".to_string(),
        });
    }
    if let Some(first_day) = project.start_date {
        if start_at < first_day.and_time(NaiveTime::MIN).and_utc() {
            return Err(Error::Session {
                message: format!("the project only starts on {first_day}"),
            });
        }
    }
    if let Some(last_day) = project.end_date {
        let closes = last_day
            .and_hms_opt(23, 59, 59)
            .map_or(DateTime::<Utc>::MAX_UTC, |t| t.and_utc());
        if end_at > closes {
            return Err(Error::Session {
                message: format!("the project ends on {last_day}"),
            });
        }
    }
    Ok(())
}

async fn check_facilitator(
    db: &DatabaseConnection,
    project: &project::Model,
    facilitator_id: i64,
) -> Result<()> {
    if project.user_id == facilitator_id {
        return Ok(());
    }
    let facilitates = relation::has_relation(
        db,
        EntityRef::User(facilitator_id),
        EntityRef::Project(project.id),
        RelationshipType::ProjectFacilitator,
    )
    .await?;
    if facilitates {
        return Ok(());
    }
    Err(Error::Session {
        message: format!(
            "user #{facilitator_id} does not facilitate project #{}",
            project.id
        ),
    })
}

async fn check_overlap(
    db: &DatabaseConnection,
    facilitator_id: i64,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    except: Option<i64>,
) -> Result<()> {
    let mut select = ProjectSession::find()
        .filter(project_session::Column::UserId.eq(facilitator_id))
        .filter(project_session::Column::StartAt.lt(end_at))
        .filter(project_session::Column::EndAt.gt(start_at));
    if let Some(id) = except {
        select = select.filter(project_session::Column::Id.ne(id));
    }
    if let Some(clash) = select.one(db).await? {
        return Err(Error::Session {
            message: format!(
                "facilitator #{facilitator_id} already runs session #{} from {} to {}",
                clash.id, clash.start_at, clash.end_at
            ),
        });
    }
    Ok(())
}

/// Schedules a session in a project.
///
/// `now` is the reference instant for the "not in the past" rule.
///
/// # Errors
/// Returns an error if:
/// - The actor may not schedule sessions in the project
/// - The facilitator neither owns nor facilitates the project
/// - The time window is invalid or overlaps the facilitator's other sessions
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn schedule_session(
    db: &DatabaseConnection,
    actor: &user::Model,
    project_id: i64,
    dto: SessionDto,
    now: DateTime<Utc>,
) -> Result<project_session::Model> {
    policy::authorize(db, actor, EntityRef::Project(project_id), Action::ScheduleSession).await?;
    let project = find_active_project(db, project_id).await?;
    let name = required_name(&dto.name, "Session")?;
    let facilitator_id = dto.facilitator_id.unwrap_or(actor.id);

    check_facilitator(db, &project, facilitator_id).await?;
    check_window(&project, dto.start_at, dto.end_at, now)?;
    check_overlap(db, facilitator_id, dto.start_at, dto.end_at, None).await?;

    let stamp = Utc::now();
    let model = project_session::ActiveModel {
        project_id: Set(project_id),
        user_id: Set(facilitator_id),
        name: Set(name),
        start_at: Set(dto.start_at),
        end_at: Set(dto.end_at),
        created_at: Set(stamp),
        updated_at: Set(stamp),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(session = created.id, project = project_id, "session scheduled");
    Ok(created)
}

async fn find_session(
    db: &DatabaseConnection,
    session_id: i64,
) -> Result<project_session::Model> {
    ProjectSession::find_by_id(session_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "session",
            id: session_id,
        })
}

/// Reschedules or renames a session, applying the same rules as [`schedule_session`].
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn update_session(
    db: &DatabaseConnection,
    actor: &user::Model,
    session_id: i64,
    dto: SessionDto,
    now: DateTime<Utc>,
) -> Result<project_session::Model> {
    let existing = find_session(db, session_id).await?;
    policy::authorize(
        db,
        actor,
        EntityRef::Project(existing.project_id),
        Action::ScheduleSession,
    )
    .await?;
    let project = find_active_project(db, existing.project_id).await?;
    let name = required_name(&dto.name, "Session")?;
    let facilitator_id = dto.facilitator_id.unwrap_or(existing.user_id);

    check_facilitator(db, &project, facilitator_id).await?;
    check_window(&project, dto.start_at, dto.end_at, now)?;
    check_overlap(db, facilitator_id, dto.start_at, dto.end_at, Some(session_id)).await?;

    let mut model: project_session::ActiveModel = existing.into();
    model.name = Set(name);
    model.user_id = Set(facilitator_id);
    model.start_at = Set(dto.start_at);
    model.end_at = Set(dto.end_at);
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Removes a session.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_session(
    db: &DatabaseConnection,
    actor: &user::Model,
    session_id: i64,
) -> Result<()> {
    let existing = find_session(db, session_id).await?;
    policy::authorize(
        db,
        actor,
        EntityRef::Project(existing.project_id),
        Action::ScheduleSession,
    )
    .await?;
    existing.delete(db).await?;
    info!(session = session_id, "session deleted");
    Ok(())
}

/// Deletes every session of a project; used when the project is deleted.
pub async fn delete_sessions_for<C>(db: &C, project_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = ProjectSession::delete_many()
        .filter(project_session::Column::ProjectId.eq(project_id))
        .exec(db)
        .await?;
    debug!(project = project_id, removed = result.rows_affected, "sessions dropped");
    Ok(result.rows_affected)
}

/// Sessions of a project in chronological order.
pub async fn sessions_for_project(
    db: &DatabaseConnection,
    project_id: i64,
) -> Result<Vec<project_session::Model>> {
    ProjectSession::find()
        .filter(project_session::Column::ProjectId.eq(project_id))
        .order_by_asc(project_session::Column::StartAt)
        .all(db)
        .await
        .map_err(Into::into)
}

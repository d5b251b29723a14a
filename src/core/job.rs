//! Job business logic - postings that can be attached to a company.

use crate::{
    core::{
        company::find_active_company,
        policy::{self, Action, Creatable},
        reference::EntityRef,
    },
    dto::{JobDto, optional_text, required_name},
    entities::{Job, job, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Posting under a company requires the right to create things in it.
async fn check_company(
    db: &DatabaseConnection,
    actor: &user::Model,
    company_id: Option<i64>,
) -> Result<()> {
    if let Some(company_id) = company_id {
        find_active_company(db, company_id).await?;
        policy::authorize(db, actor, EntityRef::Company(company_id), Action::Create).await?;
    }
    Ok(())
}

/// Posts a job.
///
/// # Errors
/// Returns an error if:
/// - The actor's account type cannot create jobs
/// - The name is blank
/// - A company is given and the actor is not its owner or an official
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn create_job(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: JobDto,
) -> Result<job::Model> {
    policy::authorize_create(actor, Creatable::Job)?;
    let name = required_name(&dto.name, "Job")?;
    check_company(db, actor, dto.company_id).await?;

    let now = chrono::Utc::now();
    let model = job::ActiveModel {
        name: Set(name),
        description: Set(optional_text(dto.description)),
        user_id: Set(actor.id),
        company_id: Set(dto.company_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(job = created.id, company = ?created.company_id, "job posted");
    Ok(created)
}

/// Finds a job by id or fails with [`Error::NotFound`].
pub async fn get_job(db: &DatabaseConnection, job_id: i64) -> Result<job::Model> {
    Job::find_by_id(job_id).one(db).await?.ok_or(Error::NotFound {
        entity: "job",
        id: job_id,
    })
}

/// All jobs, newest first.
pub async fn get_all_jobs(db: &DatabaseConnection) -> Result<Vec<job::Model>> {
    Job::find()
        .order_by_desc(job::Column::CreatedAt)
        .order_by_desc(job::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Jobs offered by a company.
pub async fn jobs_for_company(db: &DatabaseConnection, company_id: i64) -> Result<Vec<job::Model>> {
    Job::find()
        .filter(job::Column::CompanyId.eq(company_id))
        .order_by_asc(job::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Rewrites a job posting. Creator or admin only.
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn update_job(
    db: &DatabaseConnection,
    actor: &user::Model,
    job_id: i64,
    dto: JobDto,
) -> Result<job::Model> {
    let existing = get_job(db, job_id).await?;
    policy::authorize_creator(actor, existing.user_id, Creatable::Job)?;
    let name = required_name(&dto.name, "Job")?;
    if dto.company_id != existing.company_id {
        check_company(db, actor, dto.company_id).await?;
    }

    let mut model: job::ActiveModel = existing.into();
    model.name = Set(name);
    model.description = Set(optional_text(dto.description));
    model.company_id = Set(dto.company_id);
    model.updated_at = Set(chrono::Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Deletes a job posting. Creator or admin only.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn delete_job(db: &DatabaseConnection, actor: &user::Model, job_id: i64) -> Result<()> {
    let existing = get_job(db, job_id).await?;
    policy::authorize_creator(actor, existing.user_id, Creatable::Job)?;
    existing.delete(db).await?;
    info!(job = job_id, "job deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::UserType;
    use crate::test_utils::*;

    fn posting(name: &str, company_id: Option<i64>) -> JobDto {
        JobDto {
            name: name.to_string(),
            description: Some("Remote".to_string()),
            company_id,
        }
    }

    #[tokio::test]
    async fn test_create_job_for_company() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let outsider = create_test_user(&db, "Outsider", UserType::Facilitator).await?;
        let company = create_test_company(&db, &owner, "Acme").await?;

        let job = create_job(&db, &owner, posting("Intern", Some(company.id))).await?;
        assert_eq!(job.company_id, Some(company.id));

        let foreign = create_job(&db, &outsider, posting("Spy", Some(company.id))).await;
        assert!(matches!(foreign, Err(Error::Forbidden { .. })));

        let freelance = create_job(&db, &outsider, posting("Freelance", None)).await?;
        assert_eq!(freelance.company_id, None);

        let listed = jobs_for_company(&db, company.id).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(get_all_jobs(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_job_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let poster = create_test_user(&db, "Poster", UserType::Facilitator).await?;
        let company = create_test_company(&db, &owner, "Acme").await?;
        let job = create_job(&db, &poster, posting("Tutor", None)).await?;

        // moving a job under a company needs rights in that company
        let moved = update_job(&db, &poster, job.id, posting("Tutor", Some(company.id))).await;
        assert!(matches!(moved, Err(Error::Forbidden { .. })));

        let by_owner = update_job(&db, &owner, job.id, posting("Tutor", None)).await;
        assert!(matches!(by_owner, Err(Error::Forbidden { .. })));

        let renamed = update_job(&db, &poster, job.id, posting("Senior tutor", None)).await?;
        assert_eq!(renamed.name, "Senior tutor");

        delete_job(&db, &poster, job.id).await?;
        assert!(get_all_jobs(&db).await?.is_empty());
        Ok(())
    }
}

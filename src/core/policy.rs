//! Permission rules.
//!
//! Every permission decision goes through one table keyed on the actor's
//! account type and the actor's [`Standing`] towards the target. Services call
//! [`authorize`] (or [`authorize_create`] for creations that have no target yet)
//! before mutating anything.

use crate::{
    core::reference::EntityRef,
    entities::{
        Company, Project, Relation, RelationshipType, UserType, company, project, relation, user,
    },
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use tracing::warn;

/// How the actor is related to the target of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Actor created/owns the target (or owns the company a project runs under)
    Owner,
    /// Company administrator, project facilitator, or administrator of a project's company
    Official,
    /// Company member or project learner
    Member,
    /// Parent of the target user
    Guardian,
    /// The target is the actor's own account
    SelfTarget,
    /// No relationship at all
    Stranger,
}

/// Things an actor can try to do to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the target
    View,
    /// Create something inside the target (e.g. a project under a company)
    Create,
    /// Modify the target
    Update,
    /// Delete the target
    Delete,
    /// Add or remove members / participants
    ManageMembers,
    /// Send invitations regarding the target
    Invite,
    /// Answer requests addressed to the target
    Respond,
    /// Schedule sessions in a project
    ScheduleSession,
    /// Grant roles or permissions scoped to the target
    Grant,
    /// Revoke roles or permissions scoped to the target
    Revoke,
    /// Drop one's own relation to the target
    Leave,
}

/// Kinds of records whose creation is gated on account type alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creatable {
    /// Companies
    Company,
    /// Projects
    Project,
    /// Skills
    Skill,
    /// Levels
    Level,
    /// Jobs
    Job,
    /// Roles and permissions
    Catalog,
}

/// The rule table.
#[must_use]
pub const fn is_allowed(role: UserType, standing: Standing, action: Action) -> bool {
    match (role, standing, action) {
        (_, Standing::Member | Standing::Official, Action::Leave) => true,
        (_, _, Action::Leave) => false,
        (UserType::SuperAdmin, _, _) => true,
        (UserType::Admin, _, action) if !matches!(action, Action::Respond) => true,
        (_, Standing::Owner, _) => true,
        (
            _,
            Standing::Official,
            Action::View
            | Action::Create
            | Action::Update
            | Action::ManageMembers
            | Action::Invite
            | Action::Respond
            | Action::ScheduleSession
            | Action::Grant
            | Action::Revoke,
        )
        | (_, Standing::Guardian, Action::View | Action::Respond)
        | (
            _,
            Standing::SelfTarget,
            Action::View | Action::Update | Action::Respond | Action::Delete,
        )
        | (_, Standing::Member | Standing::Stranger, Action::View) => true,
        _ => false,
    }
}

/// Whether an account type may create records of the given kind.
#[must_use]
pub const fn can_create(role: UserType, what: Creatable) -> bool {
    match what {
        Creatable::Catalog => role.is_admin(),
        Creatable::Company
        | Creatable::Project
        | Creatable::Skill
        | Creatable::Level
        | Creatable::Job => matches!(
            role,
            UserType::SuperAdmin | UserType::Admin | UserType::Facilitator
        ),
    }
}

/// Fails with [`Error::Forbidden`] unless `actor` may create `what`.
pub fn authorize_create(actor: &user::Model, what: Creatable) -> Result<()> {
    if can_create(actor.user_type, what) {
        return Ok(());
    }
    warn!(actor = actor.id, ?what, "create denied");
    Err(Error::forbidden(format!(
        "a {:?} account cannot create {what:?} records",
        actor.user_type
    )))
}

/// Fails with [`Error::Forbidden`] unless `actor` created the record or is an admin.
///
/// Skills, levels, jobs and catalog entries belong to their creator rather than
/// to a company or project, so they are not covered by [`authorize`].
pub fn authorize_creator(actor: &user::Model, creator_id: i64, what: Creatable) -> Result<()> {
    if actor.id == creator_id || actor.user_type.is_admin() {
        return Ok(());
    }
    warn!(actor = actor.id, creator = creator_id, ?what, "edit denied");
    Err(Error::forbidden(format!(
        "user #{} did not create this {what:?} record",
        actor.id
    )))
}

/// Finds the relationship type `user_id` holds towards `to` among `kinds`, if any.
pub(crate) async fn held_relationship<C>(
    db: &C,
    user_id: i64,
    to: EntityRef,
    kinds: &[RelationshipType],
) -> Result<Option<RelationshipType>>
where
    C: ConnectionTrait,
{
    let found = Relation::find()
        .filter(relation::Column::ByType.eq(crate::entities::EntityKind::User))
        .filter(relation::Column::ById.eq(user_id))
        .filter(relation::Column::ToType.eq(to.kind()))
        .filter(relation::Column::ToId.eq(to.id()))
        .filter(relation::Column::RelationshipType.is_in(kinds.iter().copied()))
        .one(db)
        .await?;
    Ok(found.map(|r| r.relationship_type))
}

async fn company_standing<C>(db: &C, actor: &user::Model, company: &company::Model) -> Result<Standing>
where
    C: ConnectionTrait,
{
    if company.user_id == actor.id {
        return Ok(Standing::Owner);
    }
    let held = held_relationship(
        db,
        actor.id,
        EntityRef::Company(company.id),
        RelationshipType::CompanyMember.siblings(),
    )
    .await?;
    Ok(match held {
        Some(RelationshipType::CompanyAdministrator) => Standing::Official,
        Some(_) => Standing::Member,
        None => Standing::Stranger,
    })
}

async fn project_standing<C>(db: &C, actor: &user::Model, project: &project::Model) -> Result<Standing>
where
    C: ConnectionTrait,
{
    if project.user_id == actor.id {
        return Ok(Standing::Owner);
    }

    if let Some(company_id) = project.company_id {
        let company = Company::find_by_id(company_id)
            .filter(company::Column::IsDeleted.eq(false))
            .one(db)
            .await?;
        if let Some(company) = company {
            match company_standing(db, actor, &company).await? {
                Standing::Owner => return Ok(Standing::Owner),
                Standing::Official => return Ok(Standing::Official),
                _ => {}
            }
        }
    }

    let held = held_relationship(
        db,
        actor.id,
        EntityRef::Project(project.id),
        RelationshipType::ProjectFacilitator.siblings(),
    )
    .await?;
    Ok(match held {
        Some(RelationshipType::ProjectFacilitator) => Standing::Official,
        Some(_) => Standing::Member,
        None => Standing::Stranger,
    })
}

/// Resolves how `actor` stands towards `target`.
///
/// Fails with [`Error::NotFound`] when the target is missing or soft-deleted.
pub async fn standing_of<C>(db: &C, actor: &user::Model, target: EntityRef) -> Result<Standing>
where
    C: ConnectionTrait,
{
    target.ensure_active(db).await?;
    match target {
        EntityRef::User(id) if id == actor.id => Ok(Standing::SelfTarget),
        EntityRef::User(id) => {
            let guardian = held_relationship(
                db,
                actor.id,
                EntityRef::User(id),
                &[RelationshipType::Parent],
            )
            .await?;
            Ok(if guardian.is_some() {
                Standing::Guardian
            } else {
                Standing::Stranger
            })
        }
        EntityRef::Company(id) => {
            let company = Company::find_by_id(id)
                .one(db)
                .await?
                .ok_or(Error::NotFound {
                    entity: "company",
                    id,
                })?;
            company_standing(db, actor, &company).await
        }
        EntityRef::Project(id) => {
            let project = Project::find_by_id(id)
                .one(db)
                .await?
                .ok_or(Error::NotFound {
                    entity: "project",
                    id,
                })?;
            project_standing(db, actor, &project).await
        }
    }
}

/// Checks `action` on `target` for `actor` and returns the resolved standing.
///
/// Fails with [`Error::Forbidden`] when the rule table denies the action.
pub async fn authorize<C>(
    db: &C,
    actor: &user::Model,
    target: EntityRef,
    action: Action,
) -> Result<Standing>
where
    C: ConnectionTrait,
{
    let standing = standing_of(db, actor, target).await?;
    if is_allowed(actor.user_type, standing, action) {
        return Ok(standing);
    }
    warn!(actor = actor.id, %target, ?action, ?standing, "action denied");
    Err(Error::forbidden(format!(
        "user #{} may not {action:?} {target}",
        actor.id
    )))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::relation;
    use crate::test_utils::*;

    #[test]
    fn test_rule_table() {
        use Action::{Delete, Leave, ManageMembers, Respond, Update, View};

        assert!(is_allowed(UserType::Admin, Standing::Stranger, Delete));
        assert!(!is_allowed(UserType::Admin, Standing::Stranger, Respond));
        assert!(is_allowed(UserType::SuperAdmin, Standing::Stranger, Respond));
        assert!(!is_allowed(UserType::SuperAdmin, Standing::Stranger, Leave));

        assert!(is_allowed(UserType::Facilitator, Standing::Owner, Delete));
        assert!(!is_allowed(UserType::Facilitator, Standing::Owner, Leave));
        assert!(!is_allowed(UserType::Facilitator, Standing::Official, Delete));
        assert!(is_allowed(UserType::Facilitator, Standing::Official, ManageMembers));
        assert!(is_allowed(UserType::Learner, Standing::Member, Leave));
        assert!(!is_allowed(UserType::Learner, Standing::Member, Update));
        assert!(is_allowed(UserType::Parent, Standing::Guardian, Respond));
        assert!(is_allowed(UserType::Learner, Standing::SelfTarget, Update));
        assert!(is_allowed(UserType::Learner, Standing::Stranger, View));
        assert!(!is_allowed(UserType::Facilitator, Standing::Stranger, Update));
    }

    #[test]
    fn test_create_rules() {
        assert!(can_create(UserType::Facilitator, Creatable::Company));
        assert!(!can_create(UserType::Learner, Creatable::Project));
        assert!(!can_create(UserType::Facilitator, Creatable::Catalog));
        assert!(can_create(UserType::Admin, Creatable::Catalog));
    }

    #[tokio::test]
    async fn test_company_standing() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let admin_member = create_test_user(&db, "Second", UserType::Facilitator).await?;
        let member = create_test_user(&db, "Member", UserType::Learner).await?;
        let stranger = create_test_user(&db, "Stranger", UserType::Learner).await?;
        let company = create_test_company(&db, &owner, "Acme").await?;
        let target = EntityRef::from(&company);

        relation::create_relation(
            &db,
            EntityRef::from(&admin_member),
            target,
            RelationshipType::CompanyAdministrator,
        )
        .await?;
        relation::create_relation(
            &db,
            EntityRef::from(&member),
            target,
            RelationshipType::CompanyMember,
        )
        .await?;

        assert_eq!(standing_of(&db, &owner, target).await?, Standing::Owner);
        assert_eq!(
            standing_of(&db, &admin_member, target).await?,
            Standing::Official
        );
        assert_eq!(standing_of(&db, &member, target).await?, Standing::Member);
        assert_eq!(
            standing_of(&db, &stranger, target).await?,
            Standing::Stranger
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_company_officials_stand_over_company_projects() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let officer = create_test_user(&db, "Officer", UserType::Facilitator).await?;
        let company = create_test_company(&db, &owner, "Acme").await?;
        relation::create_relation(
            &db,
            EntityRef::from(&officer),
            EntityRef::from(&company),
            RelationshipType::CompanyAdministrator,
        )
        .await?;
        let project = create_test_project(&db, &officer, "Robotics", Some(company.id)).await?;

        assert_eq!(
            standing_of(&db, &owner, EntityRef::from(&project)).await?,
            Standing::Owner
        );
        assert_eq!(
            standing_of(&db, &officer, EntityRef::from(&project)).await?,
            Standing::Owner
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_denies_strangers() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let other = create_test_user(&db, "Other", UserType::Facilitator).await?;
        let company = create_test_company(&db, &owner, "Acme").await?;

        let result = authorize(&db, &other, EntityRef::from(&company), Action::Delete).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        let standing = authorize(&db, &owner, EntityRef::from(&company), Action::Delete).await?;
        assert_eq!(standing, Standing::Owner);
        Ok(())
    }

    #[tokio::test]
    async fn test_guardian_standing() -> Result<()> {
        let db = setup_test_db().await?;
        let parent = create_test_user(&db, "Parent", UserType::Parent).await?;
        let ward = create_test_user(&db, "Ward", UserType::Learner).await?;
        relation::create_relation(
            &db,
            EntityRef::from(&parent),
            EntityRef::from(&ward),
            RelationshipType::Parent,
        )
        .await?;

        assert_eq!(
            standing_of(&db, &parent, EntityRef::from(&ward)).await?,
            Standing::Guardian
        );
        assert_eq!(
            standing_of(&db, &ward, EntityRef::from(&ward)).await?,
            Standing::SelfTarget
        );
        Ok(())
    }
}

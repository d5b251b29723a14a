//! Request/response workflow - invitations, applications and family links.
//!
//! A request asks for a relationship to be created. Who ends up holding it
//! depends on the shape of the request:
//!
//! * company/project context, addressed to a user: an invitation; the
//!   recipient (`to`) joins `regarding`.
//! * company/project context, sent by a user to the company/project itself:
//!   an application; the sender (`from`) joins.
//! * family context: `from` asks to become `request_type` of `to`; acceptance
//!   records both directions.
//!
//! A request leaves `pending` exactly once, through a response.

use crate::{
    core::{
        policy::{self, Action},
        reference::EntityRef,
        relation,
    },
    dto::RequestDto,
    entities::{
        Company, Project, RelationContext, RelationshipType, Request, RequestState, Response,
        ResponseType, request, response, user,
    },
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Holder and target of the relation an accepted request creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// User who will hold the relation
    pub holder: EntityRef,
    /// Entity the relation will point at
    pub target: EntityRef,
}

/// Works out who gets related to what if the request is accepted.
///
/// # Errors
/// Returns [`Error::Validation`] when the request shape does not make sense
/// for its `request_type`.
pub fn outcome_of(
    from: EntityRef,
    to: EntityRef,
    regarding: EntityRef,
    kind: RelationshipType,
) -> Result<Outcome> {
    match kind.context() {
        RelationContext::Family => {
            if from.as_user().is_none() || to.as_user().is_none() {
                return Err(Error::validation("family requests link two users"));
            }
            if from == to {
                return Err(Error::validation("a user cannot send a family request to themselves"));
            }
            if regarding != to {
                return Err(Error::validation("family requests must regard the recipient"));
            }
            Ok(Outcome {
                holder: from,
                target: to,
            })
        }
        RelationContext::Company | RelationContext::Project => {
            if regarding.kind() != kind.target_kind() {
                return Err(Error::validation(format!(
                    "{kind:?} requests must regard a {:?}",
                    kind.target_kind()
                )));
            }
            if to.as_user().is_some() {
                Ok(Outcome {
                    holder: to,
                    target: regarding,
                })
            } else if from.as_user().is_some() && to == regarding {
                Ok(Outcome {
                    holder: from,
                    target: regarding,
                })
            } else {
                Err(Error::validation(
                    "requests must be addressed to a user or sent by a user to the entity they regard",
                ))
            }
        }
    }
}

async fn owner_of<C>(db: &C, target: EntityRef) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    Ok(match target {
        EntityRef::Company(id) => Company::find_by_id(id).one(db).await?.map(|c| c.user_id),
        EntityRef::Project(id) => Project::find_by_id(id).one(db).await?.map(|p| p.user_id),
        EntityRef::User(_) => None,
    })
}

/// Checks that `actor` may send this request.
async fn check_sender(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: &RequestDto,
    outcome: Outcome,
) -> Result<()> {
    let acting_as_self = dto.from.as_user() == Some(actor.id) || actor.user_type.is_admin();

    if outcome.holder == dto.from {
        // application or family request: only for oneself
        if !acting_as_self {
            return Err(Error::forbidden(format!(
                "user #{} cannot send requests on behalf of {}",
                actor.id, dto.from
            )));
        }
        return Ok(());
    }

    // invitation: sent as oneself or as the entity itself, by someone allowed to invite
    if !acting_as_self && dto.from != dto.regarding {
        return Err(Error::forbidden(format!(
            "user #{} cannot send requests on behalf of {}",
            actor.id, dto.from
        )));
    }
    policy::authorize(db, actor, dto.regarding, Action::Invite).await?;
    Ok(())
}

/// Sends an invitation, application or family request in state `pending`.
///
/// # Errors
/// Returns an error if:
/// - Any referenced entity is missing
/// - The request shape is invalid for its type
/// - The actor may not send it
/// - The future holder owns the target, already holds the relation, or an
///   identical request is already pending
#[instrument(skip(db, actor, dto), fields(actor = actor.id))]
pub async fn send_request(
    db: &DatabaseConnection,
    actor: &user::Model,
    dto: RequestDto,
) -> Result<request::Model> {
    let outcome = outcome_of(dto.from, dto.to, dto.regarding, dto.request_type)?;
    dto.from.ensure_active(db).await?;
    dto.to.ensure_active(db).await?;
    dto.regarding.ensure_active(db).await?;
    check_sender(db, actor, &dto, outcome).await?;

    if owner_of(db, outcome.target).await? == Some(outcome.holder.id()) {
        return Err(Error::Request {
            message: format!("{} owns {} already", outcome.holder, outcome.target),
        });
    }
    if relation::has_relation(db, outcome.holder, outcome.target, dto.request_type).await? {
        return Err(Error::Request {
            message: format!(
                "{} already holds {:?} towards {}",
                outcome.holder, dto.request_type, outcome.target
            ),
        });
    }

    let duplicate = Request::find()
        .filter(request::Column::FromType.eq(dto.from.kind()))
        .filter(request::Column::FromId.eq(dto.from.id()))
        .filter(request::Column::ToType.eq(dto.to.kind()))
        .filter(request::Column::ToId.eq(dto.to.id()))
        .filter(request::Column::ForType.eq(dto.regarding.kind()))
        .filter(request::Column::ForId.eq(dto.regarding.id()))
        .filter(request::Column::RequestType.eq(dto.request_type))
        .filter(request::Column::State.eq(RequestState::Pending))
        .count(db)
        .await?;
    if duplicate > 0 {
        return Err(Error::Request {
            message: "an identical request is already pending".to_string(),
        });
    }

    let now = chrono::Utc::now();
    let model = request::ActiveModel {
        user_id: Set(actor.id),
        from_type: Set(dto.from.kind()),
        from_id: Set(dto.from.id()),
        to_type: Set(dto.to.kind()),
        to_id: Set(dto.to.id()),
        for_type: Set(dto.regarding.kind()),
        for_id: Set(dto.regarding.id()),
        request_type: Set(dto.request_type),
        state: Set(RequestState::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(
        request = created.id,
        from = %dto.from,
        to = %dto.to,
        kind = ?dto.request_type,
        "request sent"
    );
    Ok(created)
}

/// Finds a request by id.
pub async fn get_request(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Option<request::Model>> {
    Request::find_by_id(request_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the response given to a request, if any.
pub async fn response_for(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Option<response::Model>> {
    Response::find()
        .filter(response::Column::RequestId.eq(request_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Answers a pending request. Accepting creates the requested relation
/// (both directions for family links) in the same transaction.
///
/// # Errors
/// Returns an error if:
/// - The request does not exist
/// - The actor is neither the recipient, a delegate of it, nor a super admin
/// - The request was already answered
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn respond_to_request(
    db: &DatabaseConnection,
    actor: &user::Model,
    request_id: i64,
    answer: ResponseType,
) -> Result<request::Model> {
    let existing = Request::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "request",
            id: request_id,
        })?;
    if existing.state != RequestState::Pending {
        return Err(Error::Request {
            message: format!("request #{request_id} was already {:?}", existing.state),
        });
    }

    let from = EntityRef::from_parts(existing.from_type, existing.from_id);
    let to = EntityRef::from_parts(existing.to_type, existing.to_id);
    let regarding = EntityRef::from_parts(existing.for_type, existing.for_id);
    policy::authorize(db, actor, to, Action::Respond).await?;
    let kind = existing.request_type;
    let outcome = outcome_of(from, to, regarding, kind)?;

    let txn = db.begin().await?;
    let now = chrono::Utc::now();
    response::ActiveModel {
        request_id: Set(request_id),
        user_id: Set(actor.id),
        response_type: Set(answer),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if answer == ResponseType::Accepted {
        relation::ensure_relation(&txn, outcome.holder, outcome.target, kind).await?;
        if let Some(reverse) = kind.reverse() {
            relation::ensure_relation(&txn, outcome.target, outcome.holder, reverse).await?;
        }
    }

    let mut model: request::ActiveModel = existing.into();
    model.state = Set(answer.into());
    model.updated_at = Set(now);
    let updated = model.update(&txn).await?;
    txn.commit().await?;

    info!(request = request_id, ?answer, "request answered");
    Ok(updated)
}

/// Withdraws a pending request. Only its creator or an admin may do this.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn cancel_request(
    db: &DatabaseConnection,
    actor: &user::Model,
    request_id: i64,
) -> Result<()> {
    let existing = Request::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "request",
            id: request_id,
        })?;
    if existing.user_id != actor.id && !actor.user_type.is_admin() {
        return Err(Error::forbidden("only the sender can cancel a request"));
    }
    if existing.state != RequestState::Pending {
        return Err(Error::Request {
            message: format!("request #{request_id} was already {:?}", existing.state),
        });
    }
    existing.delete(db).await?;
    info!(request = request_id, "request cancelled");
    Ok(())
}

/// Deletes pending requests addressed to or regarding `target`.
pub async fn delete_pending_regarding<C>(db: &C, target: EntityRef) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Request::delete_many()
        .filter(request::Column::State.eq(RequestState::Pending))
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(request::Column::ForType.eq(target.kind()))
                        .add(request::Column::ForId.eq(target.id())),
                )
                .add(
                    Condition::all()
                        .add(request::Column::ToType.eq(target.kind()))
                        .add(request::Column::ToId.eq(target.id())),
                ),
        )
        .exec(db)
        .await?;
    debug!(
        "Dropped {} pending requests concerning {}",
        result.rows_affected, target
    );
    Ok(result.rows_affected)
}

/// Pending requests addressed to `to`, oldest first.
pub async fn pending_requests_for(
    db: &DatabaseConnection,
    to: EntityRef,
) -> Result<Vec<request::Model>> {
    Request::find()
        .filter(request::Column::ToType.eq(to.kind()))
        .filter(request::Column::ToId.eq(to.id()))
        .filter(request::Column::State.eq(RequestState::Pending))
        .order_by_asc(request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All requests sent by `from`, newest first.
pub async fn requests_from(
    db: &DatabaseConnection,
    from: EntityRef,
) -> Result<Vec<request::Model>> {
    Request::find()
        .filter(request::Column::FromType.eq(from.kind()))
        .filter(request::Column::FromId.eq(from.id()))
        .order_by_desc(request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::company;
    use crate::entities::UserType;
    use crate::test_utils::*;

    fn invite(company_id: i64, from: EntityRef, user_id: i64, kind: RelationshipType) -> RequestDto {
        RequestDto {
            from,
            to: EntityRef::User(user_id),
            regarding: EntityRef::Company(company_id),
            request_type: kind,
        }
    }

    #[test]
    fn test_outcome_shapes() {
        let invitation = outcome_of(
            EntityRef::Company(1),
            EntityRef::User(2),
            EntityRef::Company(1),
            RelationshipType::CompanyMember,
        )
        .unwrap();
        assert_eq!(invitation.holder, EntityRef::User(2));
        assert_eq!(invitation.target, EntityRef::Company(1));

        let application = outcome_of(
            EntityRef::User(3),
            EntityRef::Project(9),
            EntityRef::Project(9),
            RelationshipType::ProjectLearner,
        )
        .unwrap();
        assert_eq!(application.holder, EntityRef::User(3));

        let family = outcome_of(
            EntityRef::User(3),
            EntityRef::User(4),
            EntityRef::User(4),
            RelationshipType::Parent,
        )
        .unwrap();
        assert_eq!(family.target, EntityRef::User(4));

        assert!(
            outcome_of(
                EntityRef::User(3),
                EntityRef::User(4),
                EntityRef::Project(1),
                RelationshipType::CompanyMember,
            )
            .is_err()
        );
        assert!(
            outcome_of(
                EntityRef::Company(1),
                EntityRef::Company(2),
                EntityRef::Company(2),
                RelationshipType::CompanyMember,
            )
            .is_err()
        );
    }

    #[tokio::test]
    async fn test_invitation_accepted_creates_membership() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let learner = create_test_user(&db, "Learner", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;

        let sent = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::Company(acme.id),
                learner.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await?;
        assert_eq!(sent.state, RequestState::Pending);
        assert_eq!(
            pending_requests_for(&db, EntityRef::from(&learner))
                .await?
                .len(),
            1
        );

        let answered =
            respond_to_request(&db, &learner, sent.id, ResponseType::Accepted).await?;
        assert_eq!(answered.state, RequestState::Accepted);
        assert_eq!(company::members(&db, acme.id).await?.len(), 1);

        let response = response_for(&db, sent.id).await?.unwrap();
        assert_eq!(response.user_id, learner.id);
        assert_eq!(response.response_type, ResponseType::Accepted);
        assert!(
            pending_requests_for(&db, EntityRef::from(&learner))
                .await?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_request_is_immutable_after_response() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let learner = create_test_user(&db, "Learner", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;

        let sent = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::from(&owner),
                learner.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await?;
        let declined = respond_to_request(&db, &learner, sent.id, ResponseType::Declined).await?;
        assert_eq!(declined.state, RequestState::Declined);
        assert!(company::members(&db, acme.id).await?.is_empty());

        let again = respond_to_request(&db, &learner, sent.id, ResponseType::Accepted).await;
        assert!(matches!(again, Err(Error::Request { .. })));
        assert_eq!(again.unwrap_err().status_code(), 409);

        let cancel = cancel_request(&db, &owner, sent.id).await;
        assert!(matches!(cancel, Err(Error::Request { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_only_recipient_delegate_or_superadmin_responds() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let learner = create_test_user(&db, "Learner", UserType::Learner).await?;
        let other = create_test_user(&db, "Other", UserType::Learner).await?;
        let admin = create_test_user(&db, "Admin", UserType::Admin).await?;
        let root = create_test_user(&db, "Root", UserType::SuperAdmin).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;

        let sent = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::Company(acme.id),
                learner.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await?;

        for outsider in [&other, &admin, &owner] {
            let result = respond_to_request(&db, outsider, sent.id, ResponseType::Accepted).await;
            assert!(matches!(result, Err(Error::Forbidden { .. })));
        }

        let answered = respond_to_request(&db, &root, sent.id, ResponseType::Accepted).await?;
        assert_eq!(answered.state, RequestState::Accepted);
        Ok(())
    }

    #[tokio::test]
    async fn test_application_answered_by_company_official() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let deputy = create_test_user(&db, "Deputy", UserType::Facilitator).await?;
        let applicant = create_test_user(&db, "Applicant", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;
        company::make_administrator(&db, &owner, acme.id, deputy.id).await?;

        let sent = send_request(
            &db,
            &applicant,
            RequestDto {
                from: EntityRef::from(&applicant),
                to: EntityRef::Company(acme.id),
                regarding: EntityRef::Company(acme.id),
                request_type: RelationshipType::CompanyMember,
            },
        )
        .await?;
        assert_eq!(
            pending_requests_for(&db, EntityRef::Company(acme.id))
                .await?
                .len(),
            1
        );

        let denied = respond_to_request(&db, &applicant, sent.id, ResponseType::Accepted).await;
        assert!(matches!(denied, Err(Error::Forbidden { .. })));

        respond_to_request(&db, &deputy, sent.id, ResponseType::Accepted).await?;
        assert!(
            relation::has_relation(
                &db,
                EntityRef::from(&applicant),
                EntityRef::Company(acme.id),
                RelationshipType::CompanyMember
            )
            .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_administrator_invitation_replaces_membership() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let learner = create_test_user(&db, "Learner", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;
        company::add_member(&db, &owner, acme.id, learner.id).await?;

        let sent = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::Company(acme.id),
                learner.id,
                RelationshipType::CompanyAdministrator,
            ),
        )
        .await?;
        respond_to_request(&db, &learner, sent.id, ResponseType::Accepted).await?;

        let relations = relation::relations_to(&db, EntityRef::Company(acme.id), None).await?;
        assert_eq!(relations.len(), 1);
        assert_eq!(
            relations[0].relationship_type,
            RelationshipType::CompanyAdministrator
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_send_request_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let member = create_test_user(&db, "Member", UserType::Learner).await?;
        let learner = create_test_user(&db, "Learner", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;
        company::add_member(&db, &owner, acme.id, member.id).await?;

        // members cannot invite
        let by_member = send_request(
            &db,
            &member,
            invite(
                acme.id,
                EntityRef::from(&member),
                learner.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await;
        assert!(matches!(by_member, Err(Error::Forbidden { .. })));

        // owners are never invited into their own company
        let owner_invite = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::Company(acme.id),
                owner.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await;
        assert!(matches!(owner_invite, Err(Error::Request { .. })));

        // existing members are not invited again
        let already = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::Company(acme.id),
                member.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await;
        assert!(matches!(already, Err(Error::Request { .. })));

        // duplicates of a pending request are rejected
        let dto = invite(
            acme.id,
            EntityRef::Company(acme.id),
            learner.id,
            RelationshipType::CompanyMember,
        );
        send_request(&db, &owner, dto.clone()).await?;
        let duplicate = send_request(&db, &owner, dto).await;
        assert!(matches!(duplicate, Err(Error::Request { .. })));

        // nobody speaks for another user
        let impostor = send_request(
            &db,
            &learner,
            RequestDto {
                from: EntityRef::from(&member),
                to: EntityRef::Company(acme.id),
                regarding: EntityRef::Company(acme.id),
                request_type: RelationshipType::CompanyAdministrator,
            },
        )
        .await;
        assert!(matches!(impostor, Err(Error::Forbidden { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_parent_request_creates_both_directions() -> Result<()> {
        let db = setup_test_db().await?;
        let parent = create_test_user(&db, "Parent", UserType::Parent).await?;
        let ward = create_test_user(&db, "Ward", UserType::Learner).await?;

        let sent = send_request(
            &db,
            &parent,
            RequestDto {
                from: EntityRef::from(&parent),
                to: EntityRef::from(&ward),
                regarding: EntityRef::from(&ward),
                request_type: RelationshipType::Parent,
            },
        )
        .await?;
        respond_to_request(&db, &ward, sent.id, ResponseType::Accepted).await?;

        assert!(
            relation::has_relation(
                &db,
                EntityRef::from(&parent),
                EntityRef::from(&ward),
                RelationshipType::Parent
            )
            .await?
        );
        assert!(
            relation::has_relation(
                &db,
                EntityRef::from(&ward),
                EntityRef::from(&parent),
                RelationshipType::Ward
            )
            .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_guardian_responds_for_ward() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let parent = create_test_user(&db, "Parent", UserType::Parent).await?;
        let ward = create_test_user(&db, "Ward", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;
        relation::create_relation(
            &db,
            EntityRef::from(&parent),
            EntityRef::from(&ward),
            RelationshipType::Parent,
        )
        .await?;

        let sent = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::Company(acme.id),
                ward.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await?;
        respond_to_request(&db, &parent, sent.id, ResponseType::Accepted).await?;
        assert_eq!(company::members(&db, acme.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_request() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Owner", UserType::Facilitator).await?;
        let learner = create_test_user(&db, "Learner", UserType::Learner).await?;
        let acme = create_test_company(&db, &owner, "Acme").await?;

        let sent = send_request(
            &db,
            &owner,
            invite(
                acme.id,
                EntityRef::Company(acme.id),
                learner.id,
                RelationshipType::CompanyMember,
            ),
        )
        .await?;
        assert_eq!(requests_from(&db, EntityRef::Company(acme.id)).await?.len(), 1);

        let by_recipient = cancel_request(&db, &learner, sent.id).await;
        assert!(matches!(by_recipient, Err(Error::Forbidden { .. })));

        cancel_request(&db, &owner, sent.id).await?;
        assert!(get_request(&db, sent.id).await?.is_none());
        Ok(())
    }
}

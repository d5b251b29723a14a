//! Startup seeding of the super admin account and the role/permission catalog.
//!
//! Seeding is idempotent: accounts and catalog entries that already exist are
//! left untouched, so it is safe to run on every start.

use crate::{
    config::seed::{AdminConfig, CatalogEntryConfig, SeedConfig},
    core::{catalog, system_state, user as users},
    dto::{NamedDto, UserDto},
    entities::{AuthorizationKind, User, UserType, user},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, prelude::*};
use tracing::{debug, info, instrument, warn};

/// What a seeding run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    /// Whether the configured super admin was created in this run
    pub admin_created: bool,
    /// Number of roles inserted
    pub roles_created: usize,
    /// Number of permissions inserted
    pub permissions_created: usize,
    /// Catalog entries skipped because no admin account was available
    pub skipped: usize,
}

/// Finds or creates the configured super admin.
async fn ensure_admin(
    db: &DatabaseConnection,
    admin: &AdminConfig,
    summary: &mut SeedSummary,
) -> Result<Option<user::Model>> {
    let email = admin.email.trim().to_lowercase();
    let existing = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;

    match existing {
        Some(account) if account.is_deleted => {
            warn!(%email, "configured admin account was deleted; not recreating it");
            Ok(None)
        }
        Some(account) if !account.user_type.is_admin() => {
            warn!(%email, user_type = ?account.user_type, "configured admin email belongs to a non-admin account");
            Ok(None)
        }
        Some(account) => {
            debug!(%email, "admin account already present");
            Ok(Some(account))
        }
        None => {
            let created = users::create_user(
                db,
                UserDto {
                    name: admin.name.clone(),
                    email,
                    user_type: UserType::SuperAdmin,
                },
            )
            .await?;
            info!(user = created.id, "super admin account created");
            summary.admin_created = true;
            Ok(Some(created))
        }
    }
}

/// Oldest active super admin, used when no admin is configured.
async fn first_super_admin(db: &DatabaseConnection) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::UserType.eq(UserType::SuperAdmin))
        .filter(user::Column::IsDeleted.eq(false))
        .order_by_asc(user::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn seed_entries(
    db: &DatabaseConnection,
    actor: &user::Model,
    kind: AuthorizationKind,
    entries: &[CatalogEntryConfig],
) -> Result<usize> {
    let mut created = 0;
    for entry in entries {
        let name = entry.name.trim();
        if catalog::find_entry_id(db, kind, name).await?.is_some() {
            debug!(name, ?kind, "catalog entry already present");
            continue;
        }
        let dto = NamedDto {
            name: name.to_string(),
            description: entry.description.clone(),
        };
        match kind {
            AuthorizationKind::Role => {
                catalog::create_role(db, actor, dto).await?;
            }
            AuthorizationKind::Permission => {
                catalog::create_permission(db, actor, dto).await?;
            }
        }
        created += 1;
    }
    Ok(created)
}

/// Seeds the database from `config`.
///
/// # Errors
/// Returns an error if a database operation fails or the configured admin
/// account has invalid details.
#[instrument(skip(db, config))]
pub async fn seed_from_config(db: &DatabaseConnection, config: &SeedConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let actor = match &config.admin {
        Some(admin) => ensure_admin(db, admin, &mut summary).await?,
        None => first_super_admin(db).await?,
    };

    if let Some(actor) = &actor {
        summary.roles_created =
            seed_entries(db, actor, AuthorizationKind::Role, &config.roles).await?;
        summary.permissions_created =
            seed_entries(db, actor, AuthorizationKind::Permission, &config.permissions).await?;
    } else {
        summary.skipped = config.roles.len() + config.permissions.len();
        if summary.skipped > 0 {
            warn!(
                skipped = summary.skipped,
                "no admin account available; catalog not seeded"
            );
        }
    }

    system_state::set_value(db, system_state::LAST_SEEDED_AT_KEY, &Utc::now().to_rfc3339())
        .await?;
    info!(?summary, "seeding complete");
    Ok(summary)
}

/// One-line, human readable description of a seeding run.
#[must_use]
pub fn format_seed_summary(summary: &SeedSummary) -> String {
    let mut parts = vec![format!(
        "{} role(s) and {} permission(s) added",
        summary.roles_created, summary.permissions_created
    )];
    if summary.admin_created {
        parts.insert(0, "super admin created".to_string());
    }
    if summary.skipped > 0 {
        parts.push(format!("{} catalog entr(ies) skipped", summary.skipped));
    }
    parts.join(", ")
}

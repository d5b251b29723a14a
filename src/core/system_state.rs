//! Key-value bookkeeping in the `system_state` table.
//!
//! Used for platform-wide markers such as when the catalog was last seeded.

use crate::{
    entities::{SystemState, system_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::{debug, instrument};

/// Key under which the last seeding instant is recorded (RFC 3339).
pub const LAST_SEEDED_AT_KEY: &str = "last_seeded_at";

/// Reads the value stored under `key`, if any.
#[instrument(skip(db))]
pub async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;
    debug!(key, found = state.is_some(), "system state read");
    Ok(state.map(|s| s.value))
}

/// Stores `value` under `key`, replacing any previous value.
#[instrument(skip(db))]
pub async fn set_value<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }
    debug!(key, value, "system state written");
    Ok(())
}
